//! Target configuration.
//!
//! A [`Target`] describes a timed run-in: the target position, an initial
//! point (IP) offset from it by a bearing and a distance or time, the planned
//! ground speed for the run-in and the time on target (TOT).
//!
//! Offset distance and offset time are kept consistent through explicit
//! setters: changing one, or changing the ground speed, recomputes the other
//! immediately. Moving the target recomputes its magnetic declination.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::units::{knots_to_mps, nm_to_meters};
use crate::geo::{Bearing, Coordinate, Line, Reference};
use crate::magnetic::MagneticModel;

/// Speed increase allowed on the IP-to-target leg to recover lost time.
pub const ALLOWABLE_SPEED_VARIANCE: f64 = 0.10;

/// Which offset value the pilot entered; the other one is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetType {
    #[default]
    Distance,
    Time,
}

impl fmt::Display for OffsetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => write!(f, "distance"),
            Self::Time => write!(f, "time"),
        }
    }
}

impl FromStr for OffsetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "distance" => Ok(Self::Distance),
            "time" => Ok(Self::Time),
            other => Err(format!("expected 'distance' or 'time', got '{other}'")),
        }
    }
}

/// Values applied to newly created targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDefaults {
    /// Planned run-in ground speed (kt).
    pub ground_speed_kt: f64,
    /// Whether `offset` is a distance or a time.
    pub offset_type: OffsetType,
    /// Nautical miles or minutes, depending on `offset_type`.
    pub offset: f64,
}

impl Default for TargetDefaults {
    fn default() -> Self {
        Self {
            ground_speed_kt: 120.0,
            offset_type: OffsetType::Distance,
            offset: 4.0,
        }
    }
}

/// A target and its run-in geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    id: String,
    name: String,
    coordinate: Coordinate,
    offset_bearing: f64,
    offset_bearing_is_true: bool,
    offset_type: OffsetType,
    offset_distance_nm: f64,
    offset_time_min: f64,
    ground_speed_kt: f64,
    time_on_target: Option<DateTime<Utc>>,
    declination: f64,
}

impl Target {
    /// Create a target with the given defaults and the current declination
    /// at `coordinate`.
    pub fn new(
        name: impl Into<String>,
        coordinate: Coordinate,
        defaults: &TargetDefaults,
        model: &MagneticModel,
    ) -> Self {
        let mut target = Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            coordinate,
            offset_bearing: 0.0,
            offset_bearing_is_true: false,
            offset_type: defaults.offset_type,
            offset_distance_nm: 0.0,
            offset_time_min: 0.0,
            ground_speed_kt: defaults.ground_speed_kt,
            time_on_target: None,
            declination: 0.0,
        };

        match defaults.offset_type {
            OffsetType::Distance => target.set_offset_distance(defaults.offset),
            OffsetType::Time => target.set_offset_time(defaults.offset),
        }
        target.set_coordinate(coordinate, model);
        target
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Move the target and recompute its declination.
    pub fn set_coordinate(&mut self, coordinate: Coordinate, model: &MagneticModel) {
        self.coordinate = coordinate;
        self.declination = model.declination(coordinate, Utc::now());
    }

    /// Offset bearing from the target to the IP, in [0, 360).
    pub fn offset_bearing(&self) -> f64 {
        self.offset_bearing
    }

    pub fn offset_bearing_is_true(&self) -> bool {
        self.offset_bearing_is_true
    }

    pub fn set_offset_bearing(&mut self, degrees: f64, is_true: bool) {
        self.offset_bearing = Bearing::true_north(degrees).normalized().degrees();
        self.offset_bearing_is_true = is_true;
    }

    pub fn offset_type(&self) -> OffsetType {
        self.offset_type
    }

    pub fn set_offset_type(&mut self, offset_type: OffsetType) {
        self.offset_type = offset_type;
    }

    pub fn offset_distance_nm(&self) -> f64 {
        self.offset_distance_nm
    }

    pub fn offset_time_min(&self) -> f64 {
        self.offset_time_min
    }

    /// Set the IP distance and derive the time at the planned ground speed.
    pub fn set_offset_distance(&mut self, nm: f64) {
        self.offset_distance_nm = nm;
        self.offset_time_min = nm / self.ground_speed_nm_per_min();
    }

    /// Set the IP time and derive the distance at the planned ground speed.
    pub fn set_offset_time(&mut self, minutes: f64) {
        self.offset_time_min = minutes;
        self.offset_distance_nm = self.ground_speed_nm_per_min() * minutes;
    }

    pub fn ground_speed_kt(&self) -> f64 {
        self.ground_speed_kt
    }

    /// Planned run-in speed in m/s.
    pub fn ground_speed_mps(&self) -> f64 {
        knots_to_mps(self.ground_speed_kt)
    }

    /// Change the planned ground speed, keeping whichever offset value is
    /// primary and rederiving the other.
    pub fn set_ground_speed(&mut self, knots: f64) {
        self.ground_speed_kt = knots;
        match self.offset_type {
            OffsetType::Distance => self.set_offset_distance(self.offset_distance_nm),
            OffsetType::Time => self.set_offset_time(self.offset_time_min),
        }
    }

    pub fn time_on_target(&self) -> Option<DateTime<Utc>> {
        self.time_on_target
    }

    pub fn set_time_on_target(&mut self, time_on_target: Option<DateTime<Utc>>) {
        self.time_on_target = time_on_target;
    }

    /// Magnetic declination at the target, degrees east.
    pub fn declination(&self) -> f64 {
        self.declination
    }

    /// Override the declination without consulting the magnetic model.
    pub fn set_declination(&mut self, degrees: f64) {
        self.declination = degrees;
    }

    /// The offset bearing with its north reference.
    pub fn offset_bearing_measurement(&self) -> Bearing {
        let reference = if self.offset_bearing_is_true {
            Reference::True
        } else {
            Reference::Magnetic
        };
        Bearing::new(self.offset_bearing, reference)
    }

    /// Position of the initial point.
    pub fn ip_coordinate(&self) -> Coordinate {
        let bearing = self.offset_bearing_measurement().to_true(self.declination);
        self.coordinate
            .offset_by(bearing.degrees(), nm_to_meters(self.offset_distance_nm))
    }

    /// Run-in course from IP to target, in the offset bearing's reference.
    pub fn desired_track(&self) -> Bearing {
        self.offset_bearing_measurement().reciprocal()
    }

    pub fn desired_track_true(&self) -> Bearing {
        self.desired_track().to_true(self.declination)
    }

    pub fn desired_track_magnetic(&self) -> Bearing {
        self.desired_track().to_magnetic(self.declination)
    }

    /// The run-in leg.
    pub fn ip_to_target(&self) -> Line {
        Line::new(self.ip_coordinate(), self.coordinate)
    }

    /// When the aircraft should cross the IP to arrive on time at the
    /// planned ground speed.
    pub fn desired_time_over_ip(&self) -> Option<DateTime<Utc>> {
        self.time_over_ip_at(self.ground_speed_mps())
    }

    /// Latest IP crossing that still makes the TOT with the allowable speed
    /// increase on the run-in.
    pub fn max_allowable_time_over_ip(&self) -> Option<DateTime<Utc>> {
        self.time_over_ip_at(self.ground_speed_mps() * (1.0 + ALLOWABLE_SPEED_VARIANCE))
    }

    fn time_over_ip_at(&self, speed_mps: f64) -> Option<DateTime<Utc>> {
        let tot = self.time_on_target?;
        let run_in = duration_from_secs(self.ip_to_target().length() / speed_mps)?;
        tot.checked_sub_signed(run_in)
    }

    fn ground_speed_nm_per_min(&self) -> f64 {
        self.ground_speed_kt / 60.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}/{:.1}NM ({:.1}min)",
            self.name,
            self.coordinate,
            self.offset_bearing_measurement(),
            self.offset_distance_nm,
            self.offset_time_min
        )
    }
}

/// Convert fractional seconds to a chrono duration at millisecond
/// resolution. `None` for non-finite input.
pub(crate) fn duration_from_secs(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() {
        return None;
    }
    Duration::try_milliseconds((seconds * 1000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> MagneticModel {
        MagneticModel::bundled().unwrap()
    }

    fn target_at(coordinate: Coordinate) -> Target {
        Target::new("Test", coordinate, &TargetDefaults::default(), &model())
    }

    #[test]
    fn test_defaults_distance_primary() {
        let target = target_at(Coordinate::new(38.0, -122.0));
        assert_eq!(target.offset_distance_nm(), 4.0);
        assert!((target.offset_time_min() - 2.0).abs() < 1e-12);
        assert_eq!(target.ground_speed_kt(), 120.0);
        assert!(target.time_on_target().is_none());
        assert!(!target.id().is_empty());
    }

    #[test]
    fn test_defaults_time_primary() {
        let defaults = TargetDefaults {
            ground_speed_kt: 240.0,
            offset_type: OffsetType::Time,
            offset: 3.0,
        };
        let target = Target::new("Timed", Coordinate::new(38.0, -122.0), &defaults, &model());
        assert_eq!(target.offset_time_min(), 3.0);
        assert!((target.offset_distance_nm() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = target_at(Coordinate::new(38.0, -122.0));
        let b = target_at(Coordinate::new(38.0, -122.0));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_declination_recomputed_on_move() {
        let model = model();
        let mut target = target_at(Coordinate::new(51.5, -0.12));
        let london = target.declination();
        target.set_coordinate(Coordinate::new(36.17, -115.14), &model);
        assert!(target.declination() > london + 5.0);
    }

    #[test]
    fn test_ip_coordinate() {
        let mut target = target_at(Coordinate::new(38.0, -122.0));
        target.set_offset_bearing(180.0, true);
        let ip = target.ip_coordinate();
        assert!((ip.latitude - 37.933_378_255_433_546).abs() < 1e-9);
        assert!((ip.longitude + 122.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_bearing_normalized_on_write() {
        let mut target = target_at(Coordinate::new(38.0, -122.0));
        target.set_offset_bearing(370.0, false);
        assert!((target.offset_bearing() - 10.0).abs() < 1e-9);
        target.set_offset_bearing(-30.0, false);
        assert!((target.offset_bearing() - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_distance_time_consistency() {
        let mut target = target_at(Coordinate::new(38.0, -122.0));
        target.set_offset_distance(10.0);
        assert!((target.offset_time_min() - 5.0).abs() < 1e-12);

        target.set_offset_type(OffsetType::Time);
        target.set_offset_time(5.0);
        assert!((target.offset_distance_nm() - 10.0).abs() < 1e-12);

        target.set_offset_distance(7.3);
        let minutes = target.offset_time_min();
        target.set_offset_time(minutes);
        assert!((target.offset_distance_nm() - 7.3).abs() < 1e-9);
    }

    #[test]
    fn test_ground_speed_change_keeps_primary() {
        let mut target = target_at(Coordinate::new(38.0, -122.0));
        target.set_ground_speed(240.0);
        assert_eq!(target.offset_distance_nm(), 4.0);
        assert!((target.offset_time_min() - 1.0).abs() < 1e-12);

        target.set_offset_type(OffsetType::Time);
        target.set_ground_speed(60.0);
        assert_eq!(target.offset_time_min(), 1.0);
        assert!((target.offset_distance_nm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_desired_track_magnetic_bearing() {
        let mut target = target_at(Coordinate::new(38.0, -122.0));
        target.set_declination(15.0);
        target.set_offset_bearing(45.0, false);

        assert_eq!(target.desired_track().reference(), Reference::Magnetic);
        assert!((target.desired_track_magnetic().degrees() - 225.0).abs() < 1e-9);
        assert!((target.desired_track_true().degrees() - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_desired_track_true_bearing() {
        let mut target = target_at(Coordinate::new(38.0, -122.0));
        target.set_declination(15.0);
        target.set_offset_bearing(45.0, true);

        assert!((target.desired_track_true().degrees() - 225.0).abs() < 1e-9);
        assert!((target.desired_track_magnetic().degrees() - 210.0).abs() < 1e-9);
    }

    #[test]
    fn test_times_over_ip() {
        let mut target = target_at(Coordinate::new(38.0, -122.0));
        assert!(target.desired_time_over_ip().is_none());
        assert!(target.max_allowable_time_over_ip().is_none());

        let tot = Utc::now() + Duration::minutes(30);
        target.set_time_on_target(Some(tot));

        // 4 NM at 120 kt is two minutes
        let desired = target.desired_time_over_ip().unwrap();
        assert!(((tot - desired).num_milliseconds() - 120_000).abs() <= 1);

        let latest = target.max_allowable_time_over_ip().unwrap();
        assert!(latest > desired);
        let run_in_ms = (tot - latest).num_milliseconds();
        assert!((run_in_ms - 109_091).abs() <= 1, "got {run_in_ms}");
    }

    #[test]
    fn test_offset_type_parse() {
        assert_eq!("Distance".parse::<OffsetType>().unwrap(), OffsetType::Distance);
        assert_eq!(" time ".parse::<OffsetType>().unwrap(), OffsetType::Time);
        assert!("speed".parse::<OffsetType>().is_err());
    }

    #[test]
    fn test_duration_from_secs() {
        assert_eq!(duration_from_secs(1.5), Some(Duration::milliseconds(1500)));
        assert_eq!(duration_from_secs(f64::INFINITY), None);
        assert_eq!(duration_from_secs(f64::NAN), None);
    }
}
