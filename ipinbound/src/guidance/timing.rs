//! Arrival timing severity.

use chrono::Duration;
use serde::Serialize;

use super::from_to::FromToMath;
use crate::target::duration_from_secs;

/// How far an estimated arrival is from the time on target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingStatus {
    OnTime,
    EarlyCaution,
    EarlyWarning,
    LateCaution,
    LateWarning,
}

impl TimingStatus {
    /// Classify the arrival estimate of `math`. `None` when there is no
    /// arrival estimate (not moving).
    pub fn classify(math: &FromToMath, thresholds: &TimingThresholds) -> Option<Self> {
        let delta = math.delta_tot()?;
        let base_time = duration_from_secs(math.distance() / math.target_speed_mps());
        Some(Self::classify_delta(delta, base_time, thresholds))
    }

    /// Classify an arrival error given the nominal time for the leg.
    ///
    /// The on-time band wins over the caution band, which wins over warning.
    pub fn classify_delta(
        delta_tot: Duration,
        base_time: Option<Duration>,
        thresholds: &TimingThresholds,
    ) -> Self {
        let late = delta_tot > Duration::zero();
        let magnitude = if delta_tot < Duration::zero() {
            -delta_tot
        } else {
            delta_tot
        };

        if magnitude <= thresholds.on_time_window {
            return Self::OnTime;
        }

        let caution = magnitude <= thresholds.caution_window(base_time);
        match (late, caution) {
            (true, true) => Self::LateCaution,
            (true, false) => Self::LateWarning,
            (false, true) => Self::EarlyCaution,
            (false, false) => Self::EarlyWarning,
        }
    }

    pub fn is_late(&self) -> bool {
        matches!(self, Self::LateCaution | Self::LateWarning)
    }

    pub fn is_early(&self) -> bool {
        matches!(self, Self::EarlyCaution | Self::EarlyWarning)
    }
}

/// Tunables for [`TimingStatus::classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingThresholds {
    /// Half-width of the on-time band.
    pub on_time_window: Duration,
    /// Caution half-width as a multiple of the on-time half-width.
    pub caution_multiplier: f64,
    /// Fractional speed change the pilot can make to absorb an error.
    pub max_speed_change_fraction: f64,
}

impl Default for TimingThresholds {
    fn default() -> Self {
        Self {
            on_time_window: Duration::seconds(2),
            caution_multiplier: 5.0,
            max_speed_change_fraction: 0.10,
        }
    }
}

impl TimingThresholds {
    /// Half-width of the caution band: the larger of the scaled on-time band
    /// and the time a maximum speed change recovers over the leg.
    pub fn caution_window(&self, base_time: Option<Duration>) -> Duration {
        let on_time_secs = self.on_time_window.num_milliseconds() as f64 / 1000.0;
        let scaled = on_time_secs * self.caution_multiplier;
        let recoverable = base_time
            .map(|base| base.num_milliseconds() as f64 / 1000.0 * self.max_speed_change_fraction)
            .unwrap_or(0.0);
        duration_from_secs(scaled.max(recoverable)).unwrap_or(self.on_time_window)
    }
}
