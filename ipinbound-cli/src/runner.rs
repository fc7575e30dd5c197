//! CLI runner for long-running commands.
//!
//! Loads the configuration and keeps logging alive for the lifetime of the
//! command.

use ipinbound::config::ConfigFile;
use ipinbound::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Runner that owns the loaded config and the logging guard.
pub struct CliRunner {
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config (defaults when the file is absent) and initialize logging.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!(version = ipinbound::VERSION, command, "IP Inbound starting");
        info!(log_file = %self.logging_guard.path().display(), "Logging to file");
    }
}
