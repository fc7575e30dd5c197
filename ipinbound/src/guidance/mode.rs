//! Guidance mode selection.

use std::fmt;

use chrono::Duration;
use serde::Serialize;

use super::ip_target::IpTargetMath;
use crate::geo::units::knots_to_mps;

/// What the pilot should be flying toward right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceMode {
    /// Not moving, or no TOT: show the countdown only.
    CountdownOnly,
    /// Well ahead of time: fly to the IP and hold for the countdown.
    ToIpWithCountdown,
    /// Fly to the IP adjusting speed to cross it on time.
    ToIpWithSpeedGuidance,
    /// Past the IP: fly the run-in to the target.
    ToTarget,
    /// The IP can no longer be made in time: go direct to the target.
    ToTargetBypassingIp,
}

impl fmt::Display for GuidanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CountdownOnly => "countdown",
            Self::ToIpWithCountdown => "P.POS → IP (hold)",
            Self::ToIpWithSpeedGuidance => "P.POS → IP",
            Self::ToTarget => "P.POS → Target",
            Self::ToTargetBypassingIp => "P.POS → Target (bypass IP)",
        };
        write!(f, "{label}")
    }
}

/// Limits used by [`GuidanceMode::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidanceThresholds {
    /// Ground speed below which the aircraft is considered stationary (kt).
    pub min_moving_speed_kt: f64,
    /// How far ahead of the desired IP time counts as early enough to hold.
    pub close_to_ip: Duration,
}

impl Default for GuidanceThresholds {
    fn default() -> Self {
        Self {
            min_moving_speed_kt: 30.0,
            close_to_ip: Duration::seconds(60),
        }
    }
}

impl GuidanceMode {
    /// Pick the mode for one sample. Stateless: every call looks only at the
    /// current inputs.
    pub fn classify(math: &IpTargetMath<'_>, thresholds: &GuidanceThresholds) -> Self {
        if !(math.speed_mps() > knots_to_mps(thresholds.min_moving_speed_kt)) {
            return Self::CountdownOnly;
        }
        if math.is_past_ip() {
            return Self::ToTarget;
        }

        match (math.ip_delta_time(), math.latest_ip_delta_time()) {
            (Some(ip_delta), Some(latest_delta)) => {
                if ip_delta < -thresholds.close_to_ip {
                    Self::ToIpWithCountdown
                // Late against the latest allowable IP crossing, not the desired one
                } else if latest_delta > Duration::zero() {
                    Self::ToTargetBypassingIp
                } else {
                    Self::ToIpWithSpeedGuidance
                }
            }
            _ => Self::CountdownOnly,
        }
    }

    /// Whether the mode steers to the IP.
    pub fn is_to_ip(&self) -> bool {
        matches!(self, Self::ToIpWithCountdown | Self::ToIpWithSpeedGuidance)
    }

    /// Whether the mode steers to the target.
    pub fn is_to_target(&self) -> bool {
        matches!(self, Self::ToTarget | Self::ToTargetBypassingIp)
    }
}
