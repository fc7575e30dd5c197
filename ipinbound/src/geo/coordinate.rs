//! Great-circle navigation on a spherical earth.
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east, stored as given (not wrapped)
//! - Bearings: degrees true from [`Coordinate::bearing_to`]
//! - Distance: meters (1 nm = 1852 meters)

use serde::{Deserialize, Serialize};

use super::bearing::Bearing;
use super::units::meters_to_nm;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }

    /// Initial great-circle bearing to `other`, true, in [0, 360).
    ///
    /// # Example
    ///
    /// ```
    /// use ipinbound::geo::Coordinate;
    ///
    /// let bearing = Coordinate::new(0.0, 0.0).bearing_to(&Coordinate::new(0.0, 1.0));
    /// assert!((bearing.degrees() - 90.0).abs() < 1e-9);
    /// ```
    pub fn bearing_to(&self, other: &Coordinate) -> Bearing {
        let (lat1, lon1) = self.to_radians();
        let (lat2, lon2) = other.to_radians();
        let delta_lon = lon2 - lon1;

        let y = delta_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

        Bearing::true_north(y.atan2(x).to_degrees()).normalized()
    }

    /// Haversine distance to `other` in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let (lat1, lon1) = self.to_radians();
        let (lat2, lon2) = other.to_radians();
        let delta_lat = lat2 - lat1;
        let delta_lon = lon2 - lon1;

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Haversine distance to `other` in nautical miles.
    pub fn distance_nm_to(&self, other: &Coordinate) -> f64 {
        meters_to_nm(self.distance_to(other))
    }

    /// Destination reached by travelling `distance_m` along a great circle
    /// starting on `bearing_true_deg`.
    pub fn offset_by(&self, bearing_true_deg: f64, distance_m: f64) -> Coordinate {
        let (lat1, lon1) = self.to_radians();
        let bearing = bearing_true_deg.to_radians();
        let angular_distance = distance_m / EARTH_RADIUS_M;

        let sin_lat1 = lat1.sin();
        let cos_lat1 = lat1.cos();
        let sin_d = angular_distance.sin();
        let cos_d = angular_distance.cos();

        let lat2 = (sin_lat1 * cos_d + cos_lat1 * sin_d * bearing.cos()).asin();
        let lon2 = lon1 + (bearing.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2.sin());

        Coordinate::new(lat2.to_degrees(), lon2.to_degrees())
    }

    /// Difference of the two positions projected onto the equatorial plane.
    ///
    /// Only meaningful for comparing directions over short distances.
    pub fn vector(from: &Coordinate, to: &Coordinate) -> Vector {
        let (lat1, lon1) = from.to_radians();
        let (lat2, lon2) = to.to_radians();

        Vector::new(
            lat2.cos() * lon2.cos() - lat1.cos() * lon1.cos(),
            lat2.cos() * lon2.sin() - lat1.cos() * lon1.sin(),
        )
    }

    /// Signed distance in meters from `point` to the great circle through
    /// `line`. Positive when the point lies left of the line's direction.
    pub fn crosstrack_distance(point: &Coordinate, line: &Line) -> f64 {
        let (lat1, lon1) = line.from.to_radians();
        let (lat2, lon2) = line.to.to_radians();
        let (lat3, lon3) = point.to_radians();

        let delta13 = (lat1.sin() * lat3.sin() + lat1.cos() * lat3.cos() * (lon3 - lon1).cos())
            .clamp(-1.0, 1.0)
            .acos();
        let theta13 = ((lon3 - lon1).sin() * lat3.cos())
            .atan2(lat1.cos() * lat3.sin() - lat1.sin() * lat3.cos() * (lon3 - lon1).cos());
        let theta12 = ((lon2 - lon1).sin() * lat2.cos())
            .atan2(lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * (lon2 - lon1).cos());

        -(delta13.sin() * (theta13 - theta12).sin()).asin() * EARTH_RADIUS_M
    }

    /// Longitude wrapped into [-180, 180) for display.
    pub fn normalized_longitude(&self) -> f64 {
        (self.longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ns = if self.latitude >= 0.0 { 'N' } else { 'S' };
        let longitude = self.normalized_longitude();
        let ew = if longitude >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.6}°{} {:.6}°{}",
            self.latitude.abs(),
            ns,
            longitude.abs(),
            ew
        )
    }
}

/// A directed great-circle segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub from: Coordinate,
    pub to: Coordinate,
}

impl Line {
    pub const fn new(from: Coordinate, to: Coordinate) -> Self {
        Self { from, to }
    }

    /// Length in meters.
    pub fn length(&self) -> f64 {
        self.from.distance_to(&self.to)
    }
}

/// A planar vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, rhs: &Vector) -> f64 {
        self.x * rhs.x + self.y * rhs.y
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalized(&self) -> Vector {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Vector::ZERO;
        }
        Vector::new(self.x / magnitude, self.y / magnitude)
    }
}
