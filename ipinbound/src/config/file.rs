//! Configuration file handling for ~/.ipinbound/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

pub use super::defaults::*;
pub use super::settings::*;

use crate::guidance::{GuidanceConfig, GuidanceThresholds, TimingThresholds};
use crate::location::LocationServiceConfig;
use crate::magnetic::{MagneticModel, MagneticModelError};
use crate::simulator::SimReceiverConfig;
use crate::stream::ExtrapolationConfig;
use crate::target::{duration_from_secs, TargetDefaults};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.ipinbound/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.ipinbound/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_ini_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// The commented INI text `save_to` writes.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }

    /// Location service settings.
    pub fn to_service_config(&self) -> LocationServiceConfig {
        LocationServiceConfig {
            live: ExtrapolationConfig::new(
                secs(self.location.max_extrapolation_secs),
                Duration::from_millis(self.location.resample_interval_ms),
            ),
            simulator_priority_timeout: secs(self.simulator.priority_timeout_secs),
            simulator_interval: Duration::from_millis(self.simulator.resample_interval_ms),
            simulator_enabled: self.simulator.enabled,
            simulator: SimReceiverConfig {
                port: self.simulator.port,
                ..SimReceiverConfig::default()
            },
        }
    }

    /// Guidance mode and timing thresholds.
    pub fn to_guidance_config(&self) -> GuidanceConfig {
        let guidance = &self.guidance;
        GuidanceConfig {
            thresholds: GuidanceThresholds {
                min_moving_speed_kt: guidance.min_moving_speed_kt,
                close_to_ip: duration_from_secs(guidance.close_to_ip_secs)
                    .unwrap_or_else(chrono::Duration::zero),
            },
            timing: TimingThresholds {
                on_time_window: duration_from_secs(guidance.on_time_window_secs)
                    .unwrap_or_else(chrono::Duration::zero),
                caution_multiplier: guidance.caution_multiplier,
                max_speed_change_fraction: guidance.max_speed_change_percent / 100.0,
            },
        }
    }

    pub fn to_target_defaults(&self) -> TargetDefaults {
        TargetDefaults {
            ground_speed_kt: self.target.default_ground_speed_kt,
            offset_type: self.target.default_offset_type,
            offset: self.target.default_offset,
        }
    }

    /// Load the configured coefficient table, or the bundled one.
    pub fn magnetic_model(&self) -> Result<MagneticModel, MagneticModelError> {
        match &self.magnetic.coefficients_file {
            Some(path) => MagneticModel::from_file(path),
            None => MagneticModel::bundled(),
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Get the path to the config directory (~/.ipinbound).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ipinbound")
}

/// Get the path to the config file (~/.ipinbound/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::OffsetType;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert!(config.simulator.enabled);
        assert_eq!(config.simulator.port, 49002);
        assert_eq!(config.guidance.min_moving_speed_kt, DEFAULT_MIN_MOVING_SPEED_KT);
        assert_eq!(config.target.default_offset_type, OffsetType::Distance);
        assert!(config.magnetic.coefficients_file.is_none());
        assert_eq!(config.logging.file, "ipinbound.log");
        assert!(config.logging.directory.ends_with("logs"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_defaults_bridge_to_runtime_defaults() {
        let config = ConfigFile::default();

        assert_eq!(config.to_service_config(), LocationServiceConfig::default());
        assert_eq!(config.to_guidance_config(), GuidanceConfig::default());
        assert_eq!(config.to_target_defaults(), TargetDefaults::default());
    }

    #[test]
    fn test_service_config_bridge() {
        let mut config = ConfigFile::default();
        config.simulator.enabled = false;
        config.simulator.port = 49003;
        config.simulator.priority_timeout_secs = 2.5;
        config.location.max_extrapolation_secs = 10.0;
        config.location.resample_interval_ms = 500;

        let service = config.to_service_config();
        assert!(!service.simulator_enabled);
        assert_eq!(service.simulator.port, 49003);
        assert_eq!(service.simulator_priority_timeout, Duration::from_millis(2500));
        assert_eq!(service.live.max_time, Duration::from_secs(10));
        assert_eq!(service.live.interval, Duration::from_millis(500));
    }

    #[test]
    fn test_guidance_config_bridge() {
        let mut config = ConfigFile::default();
        config.guidance.close_to_ip_secs = 90.0;
        config.guidance.max_speed_change_percent = 15.0;

        let guidance = config.to_guidance_config();
        assert_eq!(guidance.thresholds.close_to_ip, chrono::Duration::seconds(90));
        assert!((guidance.timing.max_speed_change_fraction - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_missing_coefficients_file_is_an_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = ConfigFile::default();
        config.magnetic.coefficients_file = Some(temp_dir.path().join("missing.COF"));

        assert!(matches!(
            config.magnetic_model(),
            Err(MagneticModelError::Io { .. })
        ));
        assert!(ConfigFile::default().magnetic_model().is_ok());
    }
}
