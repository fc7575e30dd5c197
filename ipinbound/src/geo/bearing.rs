//! Bearings tagged with their north reference.
//!
//! An absolute [`Bearing`] is measured from either true or magnetic north.
//! The difference of two absolute bearings is a [`RelativeBearing`], which
//! is a separate type: there is no way to turn a relative angle back into a
//! true or magnetic one.

use std::fmt;
use std::ops::Sub;

/// North reference of an absolute bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Measured from true (geographic) north.
    True,
    /// Measured from magnetic north.
    Magnetic,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "T"),
            Self::Magnetic => write!(f, "M"),
        }
    }
}

/// An absolute bearing in degrees.
///
/// Declination is positive east: a magnetic bearing is the true bearing
/// minus the local declination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bearing {
    degrees: f64,
    reference: Reference,
}

impl Bearing {
    /// Create a bearing with an explicit reference.
    pub const fn new(degrees: f64, reference: Reference) -> Self {
        Self { degrees, reference }
    }

    /// Create a true bearing.
    pub const fn true_north(degrees: f64) -> Self {
        Self::new(degrees, Reference::True)
    }

    /// Create a magnetic bearing.
    pub const fn magnetic(degrees: f64) -> Self {
        Self::new(degrees, Reference::Magnetic)
    }

    /// Angle in degrees, as stored (not necessarily normalized).
    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    /// Angle in radians.
    pub fn radians(&self) -> f64 {
        self.degrees.to_radians()
    }

    /// North reference.
    pub fn reference(&self) -> Reference {
        self.reference
    }

    /// The same bearing wrapped into [0, 360).
    pub fn normalized(&self) -> Self {
        Self::new(wrap_360(self.degrees), self.reference)
    }

    /// The opposite direction, wrapped into [0, 360), reference preserved.
    pub fn reciprocal(&self) -> Self {
        Self::new(wrap_360(self.degrees + 180.0), self.reference)
    }

    /// Express this bearing relative to true north.
    pub fn to_true(&self, declination: f64) -> Self {
        match self.reference {
            Reference::True => *self,
            Reference::Magnetic => Self::true_north(self.degrees + declination),
        }
    }

    /// Express this bearing relative to magnetic north.
    pub fn to_magnetic(&self, declination: f64) -> Self {
        match self.reference {
            Reference::True => Self::magnetic(self.degrees - declination),
            Reference::Magnetic => *self,
        }
    }

    /// Express this bearing relative to `reference`.
    pub fn to_reference(&self, reference: Reference, declination: f64) -> Self {
        match reference {
            Reference::True => self.to_true(declination),
            Reference::Magnetic => self.to_magnetic(declination),
        }
    }
}

impl Sub for Bearing {
    type Output = RelativeBearing;

    /// Signed angle from `rhs` to `self`, wrapped into [-180, 180).
    ///
    /// # Panics
    ///
    /// Panics if the two bearings use different north references. Convert
    /// one of them with [`Bearing::to_reference`] first.
    fn sub(self, rhs: Self) -> RelativeBearing {
        assert_eq!(
            self.reference, rhs.reference,
            "cannot subtract bearings with different north references"
        );
        RelativeBearing::new(self.degrees - rhs.degrees).wrapped()
    }
}

impl fmt::Display for Bearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03.0}°{}", self.normalized().degrees, self.reference)
    }
}

/// A signed angle between two absolute bearings, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeBearing {
    degrees: f64,
}

impl RelativeBearing {
    /// Create a relative bearing.
    pub const fn new(degrees: f64) -> Self {
        Self { degrees }
    }

    /// Angle in degrees.
    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    /// Angle in radians.
    pub fn radians(&self) -> f64 {
        self.degrees.to_radians()
    }

    /// Remainder modulo 360, sign preserved.
    pub fn normalized(&self) -> Self {
        Self::new(self.degrees % 360.0)
    }

    /// Wrapped into [-180, 180).
    pub fn wrapped(&self) -> Self {
        Self::new((self.degrees + 180.0).rem_euclid(360.0) - 180.0)
    }

    /// Magnitude of the angle.
    pub fn abs(&self) -> Self {
        Self::new(self.degrees.abs())
    }
}

impl fmt::Display for RelativeBearing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+.0}°", self.degrees)
    }
}

fn wrap_360(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
