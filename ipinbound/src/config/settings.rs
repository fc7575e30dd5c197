//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

use crate::target::OffsetType;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Simulator datagram listener
    pub simulator: SimulatorSettings,
    /// Live location extrapolation
    pub location: LocationSettings,
    /// Guidance mode and timing thresholds
    pub guidance: GuidanceSettings,
    /// Defaults for newly created targets
    pub target: TargetSettings,
    /// Magnetic model source
    pub magnetic: MagneticSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Simulator listener configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorSettings {
    /// Listen for simulator datagrams
    pub enabled: bool,
    /// UDP port
    pub port: u16,
    /// How long a simulator fix takes precedence over live GPS (seconds)
    pub priority_timeout_secs: f64,
    /// Spacing of extrapolated simulator positions (milliseconds)
    pub resample_interval_ms: u64,
}

/// Live location configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    /// How long to dead-reckon after the last real fix (seconds)
    pub max_extrapolation_secs: f64,
    /// Spacing of extrapolated positions (milliseconds)
    pub resample_interval_ms: u64,
}

/// Guidance thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidanceSettings {
    pub min_moving_speed_kt: f64,
    pub close_to_ip_secs: f64,
    pub on_time_window_secs: f64,
    pub caution_multiplier: f64,
    pub max_speed_change_percent: f64,
}

/// Target defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSettings {
    pub default_ground_speed_kt: f64,
    pub default_offset_type: OffsetType,
    /// Nautical miles or minutes, depending on the offset type
    pub default_offset: f64,
}

/// Magnetic model configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MagneticSettings {
    /// WMM `.COF` table to load instead of the bundled one
    pub coefficients_file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name within the directory
    pub file: String,
}
