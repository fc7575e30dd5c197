//! Position fixes and the events that carry them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LocationError;
use crate::geo::{Bearing, Coordinate};
use crate::simulator::SimSample;

/// Estimated error of each fix component. `None` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FixAccuracy {
    pub horizontal_m: Option<f64>,
    pub vertical_m: Option<f64>,
    pub course_deg: Option<f64>,
    pub speed_mps: Option<f64>,
}

impl FixAccuracy {
    /// Widen every known component by `seconds`.
    pub fn inflated(&self, seconds: f64) -> Self {
        let widen = |value: Option<f64>| value.map(|v| v + seconds);
        Self {
            horizontal_m: widen(self.horizontal_m),
            vertical_m: widen(self.vertical_m),
            course_deg: widen(self.course_deg),
            speed_mps: widen(self.speed_mps),
        }
    }
}

/// A single position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Altitude above mean sea level (meters).
    pub altitude_m: f64,
    /// True course over ground (degrees).
    pub course_deg: Option<f64>,
    /// Ground speed (m/s).
    pub speed_mps: Option<f64>,
    pub accuracy: FixAccuracy,
    /// Instant the fix describes. Advances when the fix is extrapolated.
    pub timestamp: DateTime<Utc>,
    /// Instant of the real sample this fix came from.
    pub observed_at: DateTime<Utc>,
}

impl LocationFix {
    /// A stationary fix with unknown course, speed and accuracy.
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            altitude_m: 0.0,
            course_deg: None,
            speed_mps: None,
            accuracy: FixAccuracy::default(),
            timestamp,
            observed_at: timestamp,
        }
    }

    pub fn with_motion(mut self, course_deg: f64, speed_mps: f64) -> Self {
        self.course_deg = Some(course_deg);
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }
}

/// One element of a location stream: a fix, an error, or neither.
///
/// `sim_name` is set when the fix came from a flight simulator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationEvent {
    pub fix: Option<LocationFix>,
    pub sim_name: Option<String>,
    pub error: Option<LocationError>,
}

impl LocationEvent {
    /// An event with no fix and no error.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_fix(fix: LocationFix) -> Self {
        Self {
            fix: Some(fix),
            ..Self::default()
        }
    }

    pub fn from_sim(sample: &SimSample) -> Self {
        Self {
            fix: Some(sample.to_location_fix()),
            sim_name: Some(sample.sim_name.clone()),
            error: None,
        }
    }

    pub fn from_error(error: LocationError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_simulating(&self) -> bool {
        self.sim_name.is_some()
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.fix.as_ref().map(|fix| fix.coordinate)
    }

    pub fn course_true(&self) -> Option<Bearing> {
        self.fix
            .as_ref()
            .and_then(|fix| fix.course_deg)
            .map(Bearing::true_north)
    }

    pub fn speed_mps(&self) -> Option<f64> {
        self.fix.as_ref().and_then(|fix| fix.speed_mps)
    }

    /// Dead-reckon the fix forward to `time` along its course and speed.
    ///
    /// Accuracies widen by one unit per elapsed second. The event is
    /// returned unchanged without a fix, course or speed, or when `time` is
    /// not after the fix.
    pub fn extrapolate_to(&self, time: DateTime<Utc>) -> Self {
        let Some(fix) = &self.fix else {
            return self.clone();
        };
        let (Some(course), Some(speed)) = (fix.course_deg, fix.speed_mps) else {
            return self.clone();
        };
        if time <= fix.timestamp || !course.is_finite() || !(speed >= 0.0) {
            return self.clone();
        }

        let elapsed = (time - fix.timestamp).num_milliseconds() as f64 / 1000.0;
        let fix = LocationFix {
            coordinate: fix.coordinate.offset_by(course, speed * elapsed),
            accuracy: fix.accuracy.inflated(elapsed),
            timestamp: time,
            ..fix.clone()
        };

        Self {
            fix: Some(fix),
            sim_name: self.sim_name.clone(),
            error: self.error.clone(),
        }
    }
}
