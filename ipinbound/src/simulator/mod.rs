//! Simulator ingestion.
//!
//! Listens for ForeFlight-style `XGPS` datagrams from a flight simulator
//! and turns them into [`SimSample`]s.
//!
//! # Setup
//!
//! In X-Plane: Settings → Network → "Send to ForeFlight". MSFS needs a
//! bridge that emits the same format.
//!
//! # Example
//!
//! ```ignore
//! let mut receiver = SimReceiver::with_defaults();
//! let mut samples = receiver.samples();
//! receiver.start().await;
//!
//! while let Some(sample) = samples.next().await {
//!     println!("{}: {}", sample.sim_name, sample.coordinate());
//! }
//! ```

mod protocol;
mod receiver;

pub use protocol::{parse_datagram, ParseError, SimSample, XGPS_TAG};
pub use receiver::{SimReceiver, SimReceiverConfig, SimulatorError, DEFAULT_PORT};
