//! Per-event guidance output.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::from_to::FromToMath;
use super::ip_target::IpTargetMath;
use super::mode::{GuidanceMode, GuidanceThresholds};
use super::timing::{TimingStatus, TimingThresholds};
use crate::geo::units::{meters_to_nm, mps_to_knots};
use crate::geo::Coordinate;
use crate::location::LocationEvent;
use crate::target::Target;

/// Thresholds for mode and timing classification.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GuidanceConfig {
    pub thresholds: GuidanceThresholds,
    pub timing: TimingThresholds,
}

/// One leg of guidance, magnetic bearings throughout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegSnapshot {
    pub bearing_magnetic_deg: f64,
    pub distance_nm: f64,
    pub time_to_go_secs: Option<f64>,
    pub eta: Option<DateTime<Utc>>,
    pub delta_tot_secs: Option<f64>,
}

impl LegSnapshot {
    fn from_math(math: &FromToMath) -> Self {
        Self {
            bearing_magnetic_deg: math.bearing_magnetic().normalized().degrees(),
            distance_nm: meters_to_nm(math.distance()),
            time_to_go_secs: math.time_to_go().map(seconds),
            eta: math.time_of_arrival(),
            delta_tot_secs: math.delta_tot().map(seconds),
        }
    }
}

/// Everything a display needs for one location event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub sim_name: Option<String>,
    pub position: Coordinate,
    pub ground_speed_kt: Option<f64>,
    pub track_magnetic_deg: Option<f64>,
    pub mode: GuidanceMode,
    pub timing: Option<TimingStatus>,
    pub past_ip: bool,
    pub to_ip: Option<LegSnapshot>,
    pub to_target: Option<LegSnapshot>,
    pub desired_track_magnetic_deg: f64,
    pub ip_delta_secs: Option<f64>,
    pub latest_ip_delta_secs: Option<f64>,
    pub cross_track_nm: f64,
    pub time_on_target: Option<DateTime<Utc>>,
    pub desired_time_over_ip: Option<DateTime<Utc>>,
}

impl GuidanceSnapshot {
    /// Compute guidance for `event` now. `None` when the event carries no fix.
    pub fn compute(event: &LocationEvent, target: &Target, config: &GuidanceConfig) -> Option<Self> {
        Self::compute_at(event, target, config, Utc::now())
    }

    /// Compute guidance for `event` as of `now`.
    pub fn compute_at(
        event: &LocationEvent,
        target: &Target,
        config: &GuidanceConfig,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let fix = event.fix.as_ref()?;
        let math = IpTargetMath::from_event(event, target)?.at(now);
        let mode = GuidanceMode::classify(&math, &config.thresholds);

        let to_ip = math.ppos_to_ip();
        let to_target = math.ppos_to_target();

        // Timing is shown against the leg the pilot is flying
        let timed_leg = match mode {
            GuidanceMode::ToIpWithSpeedGuidance => to_ip.as_ref(),
            GuidanceMode::ToTarget | GuidanceMode::ToTargetBypassingIp => to_target.as_ref(),
            GuidanceMode::CountdownOnly | GuidanceMode::ToIpWithCountdown => None,
        };
        let timing = timed_leg.and_then(|leg| TimingStatus::classify(leg, &config.timing));

        Some(Self {
            timestamp: fix.timestamp,
            sim_name: event.sim_name.clone(),
            position: fix.coordinate,
            ground_speed_kt: fix.speed_mps.map(mps_to_knots),
            track_magnetic_deg: event
                .course_true()
                .map(|course| course.to_magnetic(target.declination()).normalized().degrees()),
            mode,
            timing,
            past_ip: math.is_past_ip(),
            to_ip: to_ip.as_ref().map(LegSnapshot::from_math),
            to_target: to_target.as_ref().map(LegSnapshot::from_math),
            desired_track_magnetic_deg: target.desired_track_magnetic().normalized().degrees(),
            ip_delta_secs: math.ip_delta_time().map(seconds),
            latest_ip_delta_secs: math.latest_ip_delta_time().map(seconds),
            cross_track_nm: meters_to_nm(math.cross_track_distance()),
            time_on_target: target.time_on_target(),
            desired_time_over_ip: target.desired_time_over_ip(),
        })
    }

    pub fn is_simulating(&self) -> bool {
        self.sim_name.is_some()
    }
}

fn seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}
