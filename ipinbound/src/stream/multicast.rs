//! Broadcast hub for a single source stream.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::EventStream;

type Sender<T, E> = mpsc::UnboundedSender<Result<T, E>>;

#[derive(Debug, Clone)]
enum Termination<E> {
    Completed,
    Failed(E),
}

struct Registry<T, E> {
    consumers: HashMap<u64, Sender<T, E>>,
    next_id: u64,
    pump: Option<CancellationToken>,
    terminated: Option<Termination<E>>,
}

struct Shared<T, E> {
    registry: Mutex<Registry<T, E>>,
    source: tokio::sync::Mutex<EventStream<T, E>>,
}

/// Fans one source stream out to any number of consumers.
///
/// The source is pulled by a single pump task. Consumers may join and leave
/// at any time; each sees every element forwarded while it is registered.
/// When the source ends or fails, every registered consumer observes the
/// same termination, and consumers that join later observe it immediately.
///
/// Must be used from within a tokio runtime.
pub struct Multicast<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Multicast<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Wrap `source`. Nothing is pulled until [`start`](Self::start) or the
    /// first [`consume`](Self::consume).
    pub fn new(source: impl Stream<Item = Result<T, E>> + Send + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry: Mutex::new(Registry {
                    consumers: HashMap::new(),
                    next_id: 0,
                    pump: None,
                    terminated: None,
                }),
                source: tokio::sync::Mutex::new(source.boxed()),
            }),
        }
    }

    /// Register a consumer, then start the pump if it is not running.
    pub fn consume(&self) -> Consumer<T, E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut registry = self.shared.registry.lock();
            if let Some(termination) = &registry.terminated {
                if let Termination::Failed(error) = termination {
                    let _ = tx.send(Err(error.clone()));
                }
                // tx dropped here: the consumer ends right after
                return Consumer {
                    id: None,
                    rx,
                    shared: Weak::new(),
                };
            }
            let id = registry.next_id;
            registry.next_id += 1;
            registry.consumers.insert(id, tx);
            id
        };
        trace!(consumer = id, "Consumer registered");

        self.start();
        Consumer {
            id: Some(id),
            rx,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Start pumping the source. No-op while running or after termination.
    pub fn start(&self) {
        let token = {
            let mut registry = self.shared.registry.lock();
            if registry.pump.is_some() || registry.terminated.is_some() {
                return;
            }
            let token = CancellationToken::new();
            registry.pump = Some(token.clone());
            token
        };
        debug!("Multicast pump started");
        tokio::spawn(pump(Arc::clone(&self.shared), token));
    }

    /// Stop pumping. The source is kept, so a later `start` resumes it.
    pub fn stop(&self) {
        if let Some(token) = self.shared.registry.lock().pump.take() {
            token.cancel();
            debug!("Multicast pump stopped");
        }
    }

    /// Whether the pump is running.
    pub fn is_running(&self) -> bool {
        self.shared.registry.lock().pump.is_some()
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.shared.registry.lock().consumers.len()
    }
}

impl<T, E> Drop for Multicast<T, E> {
    fn drop(&mut self) {
        if let Some(token) = self.shared.registry.lock().pump.take() {
            token.cancel();
        }
    }
}

async fn pump<T, E>(shared: Arc<Shared<T, E>>, token: CancellationToken)
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    // A previous pump may still hold the source until it sees its cancellation
    let mut source = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        source = shared.source.lock() => source,
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            next = source.next() => next,
        };
        if !dispatch(&shared, next) {
            return;
        }
    }
}

/// Forward one pulled item. Returns false once the source has terminated.
fn dispatch<T, E>(shared: &Shared<T, E>, next: Option<Result<T, E>>) -> bool
where
    T: Clone,
    E: Clone,
{
    let mut registry = shared.registry.lock();
    match next {
        Some(Ok(value)) => {
            registry
                .consumers
                .retain(|_, tx| tx.send(Ok(value.clone())).is_ok());
            true
        }
        Some(Err(error)) => {
            for tx in registry.consumers.values() {
                let _ = tx.send(Err(error.clone()));
            }
            registry.consumers.clear();
            registry.terminated = Some(Termination::Failed(error));
            registry.pump = None;
            debug!("Multicast source failed");
            false
        }
        None => {
            registry.consumers.clear();
            registry.terminated = Some(Termination::Completed);
            registry.pump = None;
            debug!("Multicast source completed");
            false
        }
    }
}

/// One consumer's view of a [`Multicast`]. Dropping it deregisters only
/// this consumer.
pub struct Consumer<T, E> {
    id: Option<u64>,
    rx: mpsc::UnboundedReceiver<Result<T, E>>,
    shared: Weak<Shared<T, E>>,
}

impl<T, E> Stream for Consumer<T, E> {
    type Item = Result<T, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl<T, E> Drop for Consumer<T, E> {
    fn drop(&mut self) {
        let (Some(id), Some(shared)) = (self.id, self.shared.upgrade()) else {
            return;
        };
        shared.registry.lock().consumers.remove(&id);
        trace!(consumer = id, "Consumer deregistered");
    }
}
