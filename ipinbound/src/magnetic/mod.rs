//! World Magnetic Model.
//!
//! Converts between true and magnetic bearings by evaluating the WMM
//! spherical harmonic expansion at a position and date. A coefficient table
//! is bundled with the crate; a newer one can be loaded from disk.
//!
//! A model that fails to load is a startup error: nothing downstream can
//! produce magnetic bearings without it.

mod coefficients;
mod model;

pub use coefficients::{CoefficientRow, CoefficientTable, MagneticModelError, MAX_DEGREE};
pub use model::{MagneticField, MagneticModel, VALIDITY_YEARS};
