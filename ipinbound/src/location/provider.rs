//! Live positioning sources.

use std::sync::Arc;

use futures::{stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use super::{LocationError, LocationEvent};
use crate::stream::{receiver_stream, EventStream};

/// A live positioning source (GPS receiver, platform location service).
///
/// Each call to [`updates`](Self::updates) opens a fresh stream. An `Err`
/// element is terminal.
pub trait LocationProvider: Send + Sync {
    fn updates(&self) -> EventStream<LocationEvent, LocationError>;
}

impl<P: LocationProvider + ?Sized> LocationProvider for Arc<P> {
    fn updates(&self) -> EventStream<LocationEvent, LocationError> {
        (**self).updates()
    }
}

type Sender = mpsc::UnboundedSender<Result<LocationEvent, LocationError>>;

/// A provider fed by hand.
///
/// Clones share the same set of open streams, so an embedder can keep one
/// clone to push events while another is owned by a
/// [`LocationService`](super::LocationService).
#[derive(Clone, Default)]
pub struct ChannelLocationProvider {
    streams: Arc<Mutex<Vec<Sender>>>,
}

impl ChannelLocationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every open stream. Returns how many received it.
    pub fn send(&self, event: LocationEvent) -> usize {
        let mut streams = self.streams.lock();
        streams.retain(|tx| tx.send(Ok(event.clone())).is_ok());
        streams.len()
    }

    /// Terminate every open stream with `error`.
    pub fn fail(&self, error: LocationError) {
        let streams = std::mem::take(&mut *self.streams.lock());
        debug!(streams = streams.len(), error = %error, "Failing location streams");
        for tx in streams {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// End every open stream without an error.
    pub fn finish(&self) {
        self.streams.lock().clear();
    }

    /// Number of streams still being read.
    pub fn open_streams(&self) -> usize {
        let mut streams = self.streams.lock();
        streams.retain(|tx| !tx.is_closed());
        streams.len()
    }
}

impl LocationProvider for ChannelLocationProvider {
    fn updates(&self) -> EventStream<LocationEvent, LocationError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().push(tx);
        receiver_stream(rx)
    }
}

/// A provider that reports one fixed event and then stays silent.
///
/// Used where no live source exists, so the fused stream still has a live
/// side to fall back to.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    event: LocationEvent,
}

impl StaticLocationProvider {
    pub fn new(event: LocationEvent) -> Self {
        Self { event }
    }

    /// Reports "no fix".
    pub fn no_fix() -> Self {
        Self::new(LocationEvent::from_error(LocationError::Unavailable(
            "no live positioning source".to_string(),
        )))
    }
}

impl LocationProvider for StaticLocationProvider {
    fn updates(&self) -> EventStream<LocationEvent, LocationError> {
        stream::once(futures::future::ready(Ok(self.event.clone())))
            .chain(stream::pending())
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_channel_provider_fans_out() {
        let provider = ChannelLocationProvider::new();
        let mut first = provider.updates();
        let mut second = provider.updates();

        assert_eq!(provider.send(LocationEvent::empty()), 2);
        assert_eq!(first.next().await, Some(Ok(LocationEvent::empty())));
        assert_eq!(second.next().await, Some(Ok(LocationEvent::empty())));

        drop(second);
        assert_eq!(provider.open_streams(), 1);
        assert_eq!(provider.send(LocationEvent::empty()), 1);
    }

    #[tokio::test]
    async fn test_channel_provider_failure_is_terminal() {
        let provider = ChannelLocationProvider::new();
        let mut updates = provider.updates();

        provider.fail(LocationError::PermissionDenied);
        assert_eq!(updates.next().await, Some(Err(LocationError::PermissionDenied)));
        assert_eq!(updates.next().await, None);
        assert_eq!(provider.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_static_provider_emits_once_then_stays_open() {
        let provider = StaticLocationProvider::no_fix();
        let mut updates = provider.updates();

        let first = updates.next().await.unwrap().unwrap();
        assert!(first.fix.is_none());
        assert!(first.error.is_some());
        assert!(updates.next().now_or_never().is_none());
    }
}
