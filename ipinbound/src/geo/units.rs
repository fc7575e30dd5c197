//! Unit conversion constants.
//!
//! The guidance math works in SI units internally (meters, seconds, m/s).
//! Pilot-facing quantities arrive in nautical miles, knots and minutes; these
//! helpers keep the conversions in one place.

/// Meters in one nautical mile.
pub const METERS_PER_NM: f64 = 1852.0;

/// Meters per second in one knot.
pub const MPS_PER_KNOT: f64 = METERS_PER_NM / 3600.0;

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f64 = 9.806_65;

/// Nautical miles to meters.
#[inline]
pub fn nm_to_meters(nm: f64) -> f64 {
    nm * METERS_PER_NM
}

/// Meters to nautical miles.
#[inline]
pub fn meters_to_nm(meters: f64) -> f64 {
    meters / METERS_PER_NM
}

/// Knots to meters per second.
#[inline]
pub fn knots_to_mps(knots: f64) -> f64 {
    knots * MPS_PER_KNOT
}

/// Meters per second to knots.
#[inline]
pub fn mps_to_knots(mps: f64) -> f64 {
    mps / MPS_PER_KNOT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knots_round_trip() {
        assert!((mps_to_knots(knots_to_mps(120.0)) - 120.0).abs() < 1e-9);
        assert!((knots_to_mps(1.0) - 0.514_444).abs() < 1e-6);
    }

    #[test]
    fn test_nautical_miles() {
        assert_eq!(nm_to_meters(1.0), 1852.0);
        assert!((meters_to_nm(7408.0) - 4.0).abs() < 1e-12);
    }
}
