//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::settings::*;
use crate::simulator::DEFAULT_PORT;
use crate::target::OffsetType;

// =============================================================================
// Simulator defaults
// =============================================================================

/// Default UDP port for simulator datagrams (ForeFlight protocol).
pub const DEFAULT_SIMULATOR_PORT: u16 = DEFAULT_PORT;

/// Default simulator priority window in seconds.
pub const DEFAULT_SIMULATOR_PRIORITY_TIMEOUT_SECS: f64 = 5.0;

/// Default spacing of extrapolated positions in milliseconds.
pub const DEFAULT_RESAMPLE_INTERVAL_MS: u64 = 200;

// =============================================================================
// Location defaults
// =============================================================================

/// Default live extrapolation horizon in seconds.
pub const DEFAULT_MAX_EXTRAPOLATION_SECS: f64 = 5.0;

// =============================================================================
// Guidance defaults
// =============================================================================

/// Below this ground speed only the countdown is shown (knots).
pub const DEFAULT_MIN_MOVING_SPEED_KT: f64 = 30.0;

/// Early enough at the IP to hold instead of adjusting speed (seconds).
pub const DEFAULT_CLOSE_TO_IP_SECS: f64 = 60.0;

/// Half-width of the on-time band (seconds).
pub const DEFAULT_ON_TIME_WINDOW_SECS: f64 = 2.0;

/// Caution band as a multiple of the on-time band.
pub const DEFAULT_CAUTION_MULTIPLIER: f64 = 5.0;

/// Speed change available to absorb a timing error (percent).
pub const DEFAULT_MAX_SPEED_CHANGE_PERCENT: f64 = 10.0;

// =============================================================================
// Target defaults
// =============================================================================

/// Default planned ground speed (knots).
pub const DEFAULT_GROUND_SPEED_KT: f64 = 120.0;

/// Default IP offset (nautical miles for distance offsets).
pub const DEFAULT_OFFSET: f64 = 4.0;

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "ipinbound.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            simulator: SimulatorSettings {
                enabled: true,
                port: DEFAULT_SIMULATOR_PORT,
                priority_timeout_secs: DEFAULT_SIMULATOR_PRIORITY_TIMEOUT_SECS,
                resample_interval_ms: DEFAULT_RESAMPLE_INTERVAL_MS,
            },
            location: LocationSettings {
                max_extrapolation_secs: DEFAULT_MAX_EXTRAPOLATION_SECS,
                resample_interval_ms: DEFAULT_RESAMPLE_INTERVAL_MS,
            },
            guidance: GuidanceSettings {
                min_moving_speed_kt: DEFAULT_MIN_MOVING_SPEED_KT,
                close_to_ip_secs: DEFAULT_CLOSE_TO_IP_SECS,
                on_time_window_secs: DEFAULT_ON_TIME_WINDOW_SECS,
                caution_multiplier: DEFAULT_CAUTION_MULTIPLIER,
                max_speed_change_percent: DEFAULT_MAX_SPEED_CHANGE_PERCENT,
            },
            target: TargetSettings {
                default_ground_speed_kt: DEFAULT_GROUND_SPEED_KT,
                default_offset_type: OffsetType::Distance,
                default_offset: DEFAULT_OFFSET,
            },
            magnetic: MagneticSettings {
                coefficients_file: None,
            },
            logging: LoggingSettings {
                directory: super::file::config_directory().join("logs"),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
