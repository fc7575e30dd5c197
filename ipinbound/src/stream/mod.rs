//! Stream fusion primitives.
//!
//! Element streams carry `Result<T, E>`; an `Err` is terminal. Every
//! primitive here preserves element order from its source.
//!
//! - [`Multicast`]: one source pumped once, fanned out to many consumers
//! - [`extrapolate`]: fill gaps between real elements with synthesized ones
//! - [`bootstrap`]: emit a seed value before the source produces anything
//! - [`combine_latest`]: pair the most recent values of two streams

mod combinators;
mod extrapolate;
mod multicast;

use futures::stream::BoxStream;
use tokio::sync::mpsc;

pub use combinators::{bootstrap, combine_latest};
pub use extrapolate::{extrapolate, ExtrapolationConfig};
pub use multicast::{Consumer, Multicast};

/// A boxed stream of fallible elements.
pub type EventStream<T, E> = BoxStream<'static, Result<T, E>>;

/// Adapt an mpsc receiver into a stream that ends when every sender is gone.
pub(crate) fn receiver_stream<T: Send + 'static>(
    rx: mpsc::UnboundedReceiver<T>,
) -> BoxStream<'static, T> {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}
