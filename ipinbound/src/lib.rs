//! IP Inbound - timed run-in guidance from an initial point to a target
//!
//! The library covers everything below the presentation layer:
//!
//! - [`geo`]: spherical-earth geodesy and bearings with a north reference
//! - [`magnetic`]: World Magnetic Model declination
//! - [`target`]: a target and the IP derived from its offset
//! - [`guidance`]: time-to-go, arrival error, guidance mode and timing status
//! - [`location`]: fused live and simulator position stream
//! - [`simulator`]: ForeFlight-format UDP position ingestion
//! - [`stream`]: the stream primitives the fusion is built from
//!
//! # High-Level API
//!
//! ```ignore
//! use ipinbound::config::ConfigFile;
//! use ipinbound::guidance::GuidanceSnapshot;
//! use ipinbound::location::{LocationService, StaticLocationProvider};
//!
//! let config = ConfigFile::load()?;
//! let service = LocationService::new(StaticLocationProvider::no_fix(), config.to_service_config());
//! let mut events = service.subscribe().await;
//!
//! while let Some(Ok(event)) = events.next().await {
//!     if let Some(snapshot) = GuidanceSnapshot::compute(&event, &target, &config.to_guidance_config()) {
//!         println!("{:?} {:?}", snapshot.mode, snapshot.timing);
//!     }
//! }
//! ```

pub mod config;
pub mod geo;
pub mod guidance;
pub mod location;
pub mod logging;
pub mod magnetic;
pub mod simulator;
pub mod stream;
pub mod target;

/// Version of the IP Inbound library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
