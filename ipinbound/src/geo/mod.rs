//! Geodesy kernel.
//!
//! Spherical-earth navigation used by the guidance math: great-circle
//! bearing, distance, destination and cross-track, plus bearings tagged
//! with their north reference.

mod bearing;
mod coordinate;
pub mod units;

pub use bearing::{Bearing, Reference, RelativeBearing};
pub use coordinate::{Coordinate, Line, Vector, EARTH_RADIUS_M};
