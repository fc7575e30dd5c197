//! Point-to-point timing.

use chrono::{DateTime, Duration, Utc};

use crate::geo::units::STANDARD_GRAVITY;
use crate::geo::{Bearing, Coordinate};
use crate::target::duration_from_secs;

/// Bank angle assumed for turn-time estimates.
const BANK_ANGLE_DEG: f64 = 45.0;

/// Heading changes up to this size are flown without a turn penalty.
const SMALL_TURN_DEG: f64 = 10.0;

/// Timing from a present position to a fixed point, against a time on target.
///
/// All derived values are computed on demand relative to the evaluation
/// instant, which defaults to the moment of construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FromToMath {
    from: Coordinate,
    to: Coordinate,
    speed_mps: f64,
    track: Bearing,
    target_speed_mps: f64,
    time_on_target: DateTime<Utc>,
    declination: f64,
    now: DateTime<Utc>,
}

impl FromToMath {
    pub fn new(
        from: Coordinate,
        to: Coordinate,
        speed_mps: f64,
        track: Bearing,
        target_speed_mps: f64,
        time_on_target: DateTime<Utc>,
        declination: f64,
    ) -> Self {
        Self {
            from,
            to,
            speed_mps,
            track,
            target_speed_mps,
            time_on_target,
            declination,
            now: Utc::now(),
        }
    }

    /// Evaluate against `now` instead of the construction instant.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn from(&self) -> Coordinate {
        self.from
    }

    pub fn to(&self) -> Coordinate {
        self.to
    }

    /// Current ground speed (m/s).
    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    /// Planned ground speed for the leg (m/s).
    pub fn target_speed_mps(&self) -> f64 {
        self.target_speed_mps
    }

    pub fn time_on_target(&self) -> DateTime<Utc> {
        self.time_on_target
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn declination(&self) -> f64 {
        self.declination
    }

    pub fn track(&self) -> Bearing {
        self.track
    }

    pub fn track_true(&self) -> Bearing {
        self.track.to_true(self.declination)
    }

    pub fn track_magnetic(&self) -> Bearing {
        self.track.to_magnetic(self.declination)
    }

    /// Initial great-circle bearing to the destination (true).
    pub fn bearing(&self) -> Bearing {
        self.from.bearing_to(&self.to)
    }

    pub fn bearing_true(&self) -> Bearing {
        self.bearing().to_true(self.declination)
    }

    pub fn bearing_magnetic(&self) -> Bearing {
        self.bearing().to_magnetic(self.declination)
    }

    /// Distance to the destination in meters.
    pub fn distance(&self) -> f64 {
        self.from.distance_to(&self.to)
    }

    /// Time to reach the destination at the current speed, including a
    /// standard-rate estimate for the turn onto the bearing when the track is
    /// more than a few degrees off.
    ///
    /// `None` when the speed is zero, negative or not finite.
    pub fn time_to_go(&self) -> Option<Duration> {
        if !(self.speed_mps.is_finite() && self.speed_mps > 0.0) {
            return None;
        }

        let mut seconds = self.distance() / self.speed_mps;

        let turn = (self.bearing_magnetic() - self.track_magnetic()).abs();
        if turn.degrees() > SMALL_TURN_DEG {
            let turn_rate = STANDARD_GRAVITY * BANK_ANGLE_DEG.to_radians().tan() / self.speed_mps;
            seconds += turn.radians() / turn_rate;
        }

        duration_from_secs(seconds)
    }

    /// Estimated arrival instant.
    pub fn time_of_arrival(&self) -> Option<DateTime<Utc>> {
        self.now.checked_add_signed(self.time_to_go()?)
    }

    /// Arrival error against the TOT; positive is late.
    pub fn delta_tot(&self) -> Option<Duration> {
        Some(self.time_of_arrival()? - self.time_on_target)
    }

    pub fn is_late(&self) -> bool {
        self.delta_tot().is_some_and(|delta| delta > Duration::zero())
    }

    pub fn is_early(&self) -> bool {
        self.delta_tot().is_some_and(|delta| delta < Duration::zero())
    }
}
