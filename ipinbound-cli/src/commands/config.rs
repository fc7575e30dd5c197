//! Configuration management CLI commands.
//!
//! Provides `config init`, `config show` and `config path`.

use std::path::Path;

use clap::Subcommand;
use ipinbound::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init { force } => run_init(&config_file_path(), force),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if init_at(path, force)? {
        println!("Wrote default configuration to {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
        println!("Use --force to replace it with defaults.");
    }
    Ok(())
}

/// Write defaults to `path`; `false` when a file exists and `force` is off.
fn init_at(path: &Path, force: bool) -> Result<bool, CliError> {
    if path.exists() && !force {
        return Ok(false);
    }
    ConfigFile::default().save_to(path)?;
    Ok(true)
}

/// Show the loaded configuration, or defaults when no file exists.
fn run_show() -> Result<(), CliError> {
    let path = config_file_path();
    let config = ConfigFile::load_from(&path)?;

    if path.exists() {
        println!("; {}", path.display());
    } else {
        println!("; {} (not present, showing defaults)", path.display());
    }
    print!("{}", config.to_ini_string());
    Ok(())
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
