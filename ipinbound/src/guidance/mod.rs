//! Kinematic guidance for a timed run-in.
//!
//! [`FromToMath`] times a leg from the present position to a point;
//! [`IpTargetMath`] derives both legs of a run-in (to the IP and to the
//! target) from a [`Target`](crate::target::Target). The classifiers turn
//! those values into a [`GuidanceMode`] and a [`TimingStatus`]; both are
//! pure functions of the current sample.

mod from_to;
mod ip_target;
mod mode;
mod snapshot;
mod timing;

pub use from_to::FromToMath;
pub use ip_target::IpTargetMath;
pub use mode::{GuidanceMode, GuidanceThresholds};
pub use snapshot::{GuidanceConfig, GuidanceSnapshot, LegSnapshot};
pub use timing::{TimingStatus, TimingThresholds};
