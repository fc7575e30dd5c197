//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, show, path)
//! - [`declination`] - Magnetic field at a position
//! - [`guide`] - Live guidance from the simulator feed
//! - [`ip`] - Initial point for a target

pub mod common;
pub mod config;
pub mod declination;
pub mod guide;
pub mod ip;
