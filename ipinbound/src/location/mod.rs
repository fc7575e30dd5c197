//! Location events and the fused location service.
//!
//! Two feeds are combined into one stream of [`LocationEvent`]s:
//!
//! - the live positioning source, any [`LocationProvider`]
//! - simulator datagrams received by a [`SimReceiver`](crate::simulator::SimReceiver)
//!
//! Both are dead-reckoned between real samples. A fresh simulator fix takes
//! precedence; when it goes stale the live feed shows through again.
//!
//! # Example
//!
//! ```ignore
//! let service = LocationService::new(StaticLocationProvider::no_fix(), Default::default());
//! let mut events = service.subscribe().await;
//!
//! while let Some(Ok(event)) = events.next().await {
//!     if let Some(coordinate) = event.coordinate() {
//!         println!("{coordinate}");
//!     }
//! }
//! events.close().await;
//! ```

mod error;
mod event;
mod provider;
mod service;

pub use error::LocationError;
pub use event::{FixAccuracy, LocationEvent, LocationFix};
pub use provider::{ChannelLocationProvider, LocationProvider, StaticLocationProvider};
pub use service::{select_event, LocationService, LocationServiceConfig, LocationSubscription};
