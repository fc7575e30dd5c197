//! Spherical harmonic evaluation of the World Magnetic Model.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{debug, warn};

use super::coefficients::{CoefficientTable, MagneticModelError, MAX_DEGREE};
use crate::geo::Coordinate;

/// Mean radius of the IAU-66 ellipsoid (km).
const IAU66_RADIUS_KM: f64 = 6371.2;

/// WGS-84 semi-major axis (km).
const WGS84_A_KM: f64 = 6378.137;

/// WGS-84 semi-minor axis (km).
const WGS84_B_KM: f64 = 6356.752_314_2;

/// Years a coefficient table stays valid after its epoch.
pub const VALIDITY_YEARS: f64 = 5.0;

const SIZE: usize = MAX_DEGREE + 1;

type Grid = [[f64; SIZE]; SIZE];

/// Geomagnetic field components at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticField {
    /// Declination in degrees, positive east.
    pub declination: f64,
    /// Inclination (dip) in degrees, positive down.
    pub inclination: f64,
    /// Total intensity (nT).
    pub total_intensity: f64,
    /// Horizontal intensity (nT).
    pub horizontal_intensity: f64,
    /// Northerly component (nT).
    pub north_intensity: f64,
    /// Easterly component (nT).
    pub east_intensity: f64,
    /// Vertical component (nT), positive down.
    pub vertical_intensity: f64,
}

/// A loaded magnetic model.
///
/// Coefficients are Schmidt-unnormalized once at load time. Every
/// [`field`](Self::field) call recomputes from scratch, so a single
/// instance can be shared behind an `Arc` without locking.
#[derive(Debug)]
pub struct MagneticModel {
    epoch: f64,
    name: String,
    /// Main field: `g` in `[m][n]`, `h` in `[n][m - 1]`.
    c: Grid,
    /// Secular variation, same layout as `c`.
    cd: Grid,
    /// Legendre recursion constants.
    k: Grid,
    fn_: [f64; SIZE],
    fm: [f64; SIZE],
    warned_out_of_range: AtomicBool,
}

impl MagneticModel {
    /// Load the coefficient table compiled into the crate.
    pub fn bundled() -> Result<Self, MagneticModelError> {
        let table = CoefficientTable::parse(include_str!("../../data/WMM.COF"))?;
        Ok(Self::from_table(&table))
    }

    /// Load a coefficient table from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MagneticModelError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| MagneticModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = CoefficientTable::parse(&contents)?;
        debug!(path = %path.display(), model = %table.model_name, "Loaded magnetic model");
        Ok(Self::from_table(&table))
    }

    /// Build a model from a parsed table.
    pub fn from_table(table: &CoefficientTable) -> Self {
        let mut c: Grid = [[0.0; SIZE]; SIZE];
        let mut cd: Grid = [[0.0; SIZE]; SIZE];
        let mut k: Grid = [[0.0; SIZE]; SIZE];
        let mut fn_ = [0.0; SIZE];
        let mut fm = [0.0; SIZE];

        for row in &table.rows {
            c[row.m][row.n] = row.gnm;
            cd[row.m][row.n] = row.dgnm;
            if row.m != 0 {
                c[row.n][row.m - 1] = row.hnm;
                cd[row.n][row.m - 1] = row.dhnm;
            }
        }

        // Schmidt quasi-normalized to unnormalized
        let mut snorm = [[0.0; SIZE]; SIZE];
        snorm[0][0] = 1.0;
        for n in 1..=MAX_DEGREE {
            let nf = n as f64;
            snorm[0][n] = snorm[0][n - 1] * (2.0 * nf - 1.0) / nf;
            let mut j = 2.0;
            for m in 0..=n {
                let mf = m as f64;
                k[m][n] = ((nf - 1.0).powi(2) - mf * mf) / ((2.0 * nf - 1.0) * (2.0 * nf - 3.0));
                if m > 0 {
                    let flnmj = (nf - mf + 1.0) * j / (nf + mf);
                    snorm[m][n] = snorm[m - 1][n] * flnmj.sqrt();
                    j = 1.0;
                    c[n][m - 1] *= snorm[m][n];
                    cd[n][m - 1] *= snorm[m][n];
                }
                c[m][n] *= snorm[m][n];
                cd[m][n] *= snorm[m][n];
            }
            fn_[n] = nf + 1.0;
            fm[n] = nf;
        }
        k[1][1] = 0.0;

        Self {
            epoch: table.epoch,
            name: table.model_name.clone(),
            c,
            cd,
            k,
            fn_,
            fm,
            warned_out_of_range: AtomicBool::new(false),
        }
    }

    /// Model epoch as a decimal year.
    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    /// Model name from the table header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `date` falls inside the five-year validity window.
    pub fn is_valid_for(&self, date: DateTime<Utc>) -> bool {
        let year = decimal_year(date);
        year >= self.epoch && year < self.epoch + VALIDITY_YEARS
    }

    /// Declination in degrees (positive east) at sea level.
    pub fn declination(&self, coordinate: Coordinate, date: DateTime<Utc>) -> f64 {
        self.field(coordinate.latitude, coordinate.longitude, 0.0, date)
            .declination
    }

    /// Evaluate the field at a geodetic position.
    ///
    /// `altitude_m` is height above the WGS-84 ellipsoid; NaN is treated as
    /// sea level.
    pub fn field(
        &self,
        latitude: f64,
        longitude: f64,
        altitude_m: f64,
        date: DateTime<Utc>,
    ) -> MagneticField {
        if !self.is_valid_for(date) && !self.warned_out_of_range.swap(true, Ordering::Relaxed) {
            warn!(
                model = %self.name,
                epoch = self.epoch,
                date = %date.date_naive(),
                "Date is outside the magnetic model validity window; declination may be inaccurate"
            );
        }

        let altitude_km = if altitude_m.is_nan() {
            0.0
        } else {
            altitude_m / 1000.0
        };
        let dt = decimal_year(date) - self.epoch;

        let rlat = latitude.to_radians();
        let rlon = longitude.to_radians();
        let srlat = rlat.sin();
        let crlat = rlat.cos();
        let srlat2 = srlat * srlat;
        let crlat2 = crlat * crlat;

        let a2 = WGS84_A_KM * WGS84_A_KM;
        let b2 = WGS84_B_KM * WGS84_B_KM;
        let c2 = a2 - b2;
        let a4 = a2 * a2;
        let b4 = b2 * b2;
        let c4 = a4 - b4;

        // Geodetic to spherical
        let q = (a2 - c2 * srlat2).sqrt();
        let q1 = altitude_km * q;
        let q2 = ((q1 + a2) / (q1 + b2)).powi(2);
        let r2 = altitude_km * altitude_km + 2.0 * q1 + (a4 - c4 * srlat2) / (q * q);
        let ct = srlat / (q2 * crlat2 + srlat2).sqrt();
        let st = (1.0 - ct * ct).max(0.0).sqrt();
        let r = r2.sqrt();
        let d = (a2 * crlat2 + b2 * srlat2).sqrt();
        let ca = (altitude_km + d) / r;
        let sa = c2 * crlat * srlat / (r * d);
        let at_pole = st < f64::EPSILON;

        let mut sp = [0.0; SIZE];
        let mut cp = [0.0; SIZE];
        cp[0] = 1.0;
        sp[1] = rlon.sin();
        cp[1] = rlon.cos();
        for m in 2..=MAX_DEGREE {
            sp[m] = sp[1] * cp[m - 1] + cp[1] * sp[m - 1];
            cp[m] = cp[1] * cp[m - 1] - sp[1] * sp[m - 1];
        }

        // p holds the unnormalized Legendre functions, dp their theta derivatives
        let mut p: Grid = [[0.0; SIZE]; SIZE];
        let mut dp: Grid = [[0.0; SIZE]; SIZE];
        let mut pp = [0.0; SIZE];
        p[0][0] = 1.0;
        pp[0] = 1.0;

        let aor = IAU66_RADIUS_KM / r;
        let mut ar = aor * aor;
        let (mut br, mut bt, mut bp, mut bpp) = (0.0, 0.0, 0.0, 0.0);

        for n in 1..=MAX_DEGREE {
            ar *= aor;
            for m in 0..=n {
                if n == m {
                    p[m][n] = st * p[m - 1][n - 1];
                    dp[m][n] = st * dp[m - 1][n - 1] + ct * p[m - 1][n - 1];
                } else if n == 1 && m == 0 {
                    p[m][n] = ct * p[m][n - 1];
                    dp[m][n] = ct * dp[m][n - 1] - st * p[m][n - 1];
                } else {
                    if m + 2 > n {
                        p[m][n - 2] = 0.0;
                        dp[m][n - 2] = 0.0;
                    }
                    p[m][n] = ct * p[m][n - 1] - self.k[m][n] * p[m][n - 2];
                    dp[m][n] =
                        ct * dp[m][n - 1] - st * p[m][n - 1] - self.k[m][n] * dp[m][n - 2];
                }

                let g = self.c[m][n] + dt * self.cd[m][n];
                let h = if m == 0 {
                    0.0
                } else {
                    self.c[n][m - 1] + dt * self.cd[n][m - 1]
                };

                let par = ar * p[m][n];
                let temp1 = g * cp[m] + h * sp[m];
                let temp2 = g * sp[m] - h * cp[m];

                bt -= ar * temp1 * dp[m][n];
                bp += self.fm[m] * temp2 * par;
                br += self.fn_[n] * temp1 * par;

                if at_pole && m == 1 {
                    pp[n] = if n == 1 {
                        pp[n - 1]
                    } else {
                        ct * pp[n - 1] - self.k[m][n] * pp[n - 2]
                    };
                    bpp += self.fm[m] * temp2 * ar * pp[n];
                }
            }
        }

        if at_pole {
            bp = bpp;
        } else {
            bp /= st;
        }

        // Spherical to geodetic
        let north = -bt * ca - br * sa;
        let east = bp;
        let vertical = bt * sa - br * ca;
        let horizontal = north.hypot(east);
        let total = horizontal.hypot(vertical);

        MagneticField {
            declination: east.atan2(north).to_degrees(),
            inclination: vertical.atan2(horizontal).to_degrees(),
            total_intensity: total,
            horizontal_intensity: horizontal,
            north_intensity: north,
            east_intensity: east,
            vertical_intensity: vertical,
        }
    }
}

/// Calendar year plus the fraction elapsed, counting the current day.
fn decimal_year(date: DateTime<Utc>) -> f64 {
    let year = date.year();
    let days_in_year = NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|last| last.ordinal())
        .unwrap_or(365);
    year as f64 + date.ordinal() as f64 / days_in_year as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn model() -> MagneticModel {
        MagneticModel::bundled().unwrap()
    }

    fn mid_2026() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_bundled_model_metadata() {
        let model = model();
        assert_eq!(model.epoch(), 2025.0);
        assert_eq!(model.name(), "WMM-2025");
    }

    #[test]
    fn test_bundled_model_is_current() {
        assert!(model().is_valid_for(Utc::now()));
    }

    #[test]
    fn test_declination_las_vegas() {
        let declination = model().declination(Coordinate::new(36.17, -115.14), mid_2026());
        assert!(
            (9.0..13.5).contains(&declination),
            "expected roughly 11 degrees east, got {declination}"
        );
    }

    #[test]
    fn test_declination_london_is_small() {
        let declination = model().declination(Coordinate::new(51.5, -0.12), mid_2026());
        assert!(declination.abs() < 3.0, "got {declination}");
    }

    #[test]
    fn test_field_components_are_consistent() {
        let field = model().field(36.17, -115.14, 1000.0, mid_2026());
        assert!((20_000.0..70_000.0).contains(&field.total_intensity));
        assert!(field.inclination > 0.0, "northern hemisphere dips down");
        let horizontal = (field.north_intensity.powi(2) + field.east_intensity.powi(2)).sqrt();
        assert!((horizontal - field.horizontal_intensity).abs() < 1e-6);
    }

    #[test]
    fn test_southern_hemisphere_dips_up() {
        let field = model().field(-33.9, 151.2, 0.0, mid_2026());
        assert!(field.inclination < 0.0);
    }

    #[test]
    fn test_pole_is_finite() {
        let field = model().field(90.0, 0.0, 0.0, mid_2026());
        assert!(field.declination.is_finite());
        assert!(field.total_intensity.is_finite() && field.total_intensity > 0.0);
    }

    #[test]
    fn test_nan_altitude_is_sea_level() {
        let model = model();
        let sea_level = model.field(36.17, -115.14, 0.0, mid_2026());
        let nan = model.field(36.17, -115.14, f64::NAN, mid_2026());
        assert_eq!(sea_level, nan);
    }

    #[test]
    fn test_validity_window() {
        let model = model();
        assert!(model.is_valid_for(mid_2026()));
        assert!(model.is_valid_for(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert!(!model.is_valid_for(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()));
        assert!(!model.is_valid_for(Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_secular_variation_moves_declination() {
        let model = model();
        let coordinate = Coordinate::new(36.17, -115.14);
        let early = model.declination(coordinate, Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap());
        let late = model.declination(coordinate, Utc.with_ymd_and_hms(2029, 12, 1, 0, 0, 0).unwrap());
        assert!(early != late);
        assert!((early - late).abs() < 1.5);
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let result = MagneticModel::from_file("/nonexistent/WMM.COF");
        assert!(matches!(result, Err(MagneticModelError::Io { .. })));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("WMM.COF");
        std::fs::write(&path, include_str!("../../data/WMM.COF")).unwrap();
        let model = MagneticModel::from_file(&path).unwrap();
        assert_eq!(model.epoch(), 2025.0);
    }

    #[test]
    fn test_decimal_year() {
        let year = decimal_year(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        assert!((year - (2021.0 + 1.0 / 365.0)).abs() < 1e-12);
    }
}
