//! Run-in geometry relative to a target's initial point.

use chrono::{DateTime, Duration, Utc};

use super::from_to::FromToMath;
use crate::geo::{Bearing, Coordinate};
use crate::location::LocationEvent;
use crate::target::Target;

/// Guidance values for a present position against a configured target.
///
/// Everything that depends on the time on target is `None` while the target
/// has no TOT.
#[derive(Debug, Clone)]
pub struct IpTargetMath<'a> {
    coordinate: Coordinate,
    speed_mps: f64,
    course: Bearing,
    target: &'a Target,
    now: DateTime<Utc>,
}

impl<'a> IpTargetMath<'a> {
    pub fn new(coordinate: Coordinate, speed_mps: f64, course: Bearing, target: &'a Target) -> Self {
        Self {
            coordinate,
            speed_mps,
            course,
            target,
            now: Utc::now(),
        }
    }

    /// Build from a location event's fix. Missing course or speed count as
    /// zero; `None` without a fix.
    pub fn from_event(event: &LocationEvent, target: &'a Target) -> Option<Self> {
        let fix = event.fix.as_ref()?;
        Some(Self::new(
            fix.coordinate,
            fix.speed_mps.unwrap_or(0.0),
            Bearing::true_north(fix.course_deg.unwrap_or(0.0)),
            target,
        ))
    }

    /// Evaluate against `now` instead of the construction instant.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn course(&self) -> Bearing {
        self.course
    }

    pub fn target(&self) -> &Target {
        self.target
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn leg_to(&self, to: Coordinate) -> Option<FromToMath> {
        let time_on_target = self.target.time_on_target()?;
        Some(
            FromToMath::new(
                self.coordinate,
                to,
                self.speed_mps,
                self.course,
                self.target.ground_speed_mps(),
                time_on_target,
                self.target.declination(),
            )
            .at(self.now),
        )
    }

    /// Present position to the initial point.
    pub fn ppos_to_ip(&self) -> Option<FromToMath> {
        self.leg_to(self.target.ip_coordinate())
    }

    /// Present position direct to the target.
    pub fn ppos_to_target(&self) -> Option<FromToMath> {
        self.leg_to(self.target.coordinate())
    }

    /// Whether the present position lies beyond the line through the IP
    /// perpendicular to the run-in. Distance off the run-in does not matter.
    pub fn is_past_ip(&self) -> bool {
        let ip = self.target.ip_coordinate();
        let run_in = Coordinate::vector(&ip, &self.target.coordinate()).normalized();
        let ip_to_position = Coordinate::vector(&ip, &self.coordinate);

        ip_to_position.dot(&run_in) > 0.0
    }

    /// Estimated arrival at the IP.
    pub fn ip_eta(&self) -> Option<DateTime<Utc>> {
        self.ppos_to_ip()?.time_of_arrival()
    }

    /// IP arrival error against the desired IP crossing; positive is late.
    pub fn ip_delta_time(&self) -> Option<Duration> {
        Some(self.ip_eta()? - self.target.desired_time_over_ip()?)
    }

    /// IP arrival error against the latest crossing that can still make the
    /// TOT; positive means the TOT is out of reach through the IP.
    pub fn latest_ip_delta_time(&self) -> Option<Duration> {
        Some(self.ip_eta()? - self.target.max_allowable_time_over_ip()?)
    }

    /// Signed distance off the run-in (meters), positive left of course.
    pub fn cross_track_distance(&self) -> f64 {
        Coordinate::crosstrack_distance(&self.coordinate, &self.target.ip_to_target())
    }
}
