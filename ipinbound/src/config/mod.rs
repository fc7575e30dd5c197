//! User configuration in `~/.ipinbound/config.ini`.
//!
//! ```ignore
//! use ipinbound::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let service = LocationService::new(provider, config.to_service_config());
//! let guidance = config.to_guidance_config();
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use defaults::*;
pub use settings::{
    ConfigFile, GuidanceSettings, LocationSettings, LoggingSettings, MagneticSettings,
    SimulatorSettings, TargetSettings,
};
