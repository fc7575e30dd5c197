//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use ipinbound::config::{config_file_path, ConfigFileError};
use ipinbound::location::LocationError;
use ipinbound::magnetic::MagneticModelError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// Magnetic coefficient table could not be loaded
    MagneticModel(MagneticModelError),
    /// A command-line value is out of range or malformed
    InvalidArgument(String),
    /// The async runtime could not be created
    Runtime(std::io::Error),
    /// The simulator port could not be bound
    SimulatorUnavailable { port: u16 },
    /// The position feed failed
    Location(LocationError),
    /// Failed to encode output
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigFileError::InvalidValue { section, key, .. }) => {
                eprintln!();
                eprintln!(
                    "Fix [{}] {} in {}",
                    section,
                    key,
                    config_file_path().display()
                );
                eprintln!("or regenerate defaults with: ipinbound config init --force");
            }
            CliError::SimulatorUnavailable { .. } => {
                eprintln!();
                eprintln!("Another application is using this UDP port. Choose another with");
                eprintln!("--port and point the simulator's data output at it.");
            }
            CliError::MagneticModel(_) => {
                eprintln!();
                eprintln!("Check magnetic.coefficients_file in your config, or remove it");
                eprintln!("to use the bundled World Magnetic Model.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::MagneticModel(e) => write!(f, "Failed to load magnetic model: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "{}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::SimulatorUnavailable { port } => {
                write!(f, "Cannot listen for simulator data on UDP port {}", port)
            }
            CliError::Location(e) => write!(f, "Position feed failed: {}", e),
            CliError::Output(e) => write!(f, "Failed to encode output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::MagneticModel(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Location(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<MagneticModelError> for CliError {
    fn from(e: MagneticModelError) -> Self {
        CliError::MagneticModel(e)
    }
}

impl From<LocationError> for CliError {
    fn from(e: LocationError) -> Self {
        CliError::Location(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
