//! Dead-reckoning between real elements.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use super::{receiver_stream, EventStream};

/// Horizon and rate for [`extrapolate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtrapolationConfig {
    /// How long after a real element synthesized elements keep coming.
    pub max_time: Duration,
    /// Spacing of synthesized elements.
    pub interval: Duration,
}

impl ExtrapolationConfig {
    pub const fn new(max_time: Duration, interval: Duration) -> Self {
        Self { max_time, interval }
    }
}

/// Forward every element of `source`, and after each one emit
/// `extrapolator(&last, elapsed)` every `interval` until `max_time` has
/// passed or the next real element arrives.
///
/// An error is forwarded and ends the stream. When the source ends, the
/// pending synthesis runs out its horizon before the stream ends. Dropping
/// the returned stream stops all background work.
///
/// Must be called from within a tokio runtime.
pub fn extrapolate<T, E, S, F>(
    source: S,
    config: ExtrapolationConfig,
    extrapolator: F,
) -> EventStream<T, E>
where
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Clone + Send + 'static,
    E: Send + 'static,
    F: Fn(&T, Duration) -> T + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(forward(source, config, Arc::new(extrapolator), tx));
    receiver_stream(rx)
}

struct Synthesis {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Synthesis {
    async fn cancel(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

async fn forward<T, E, S, F>(
    source: S,
    config: ExtrapolationConfig,
    extrapolator: Arc<F>,
    tx: mpsc::UnboundedSender<Result<T, E>>,
) where
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Clone + Send + 'static,
    E: Send + 'static,
    F: Fn(&T, Duration) -> T + Send + Sync + 'static,
{
    let mut source = std::pin::pin!(source);
    let mut pending: Option<Synthesis> = None;

    loop {
        let next = tokio::select! {
            _ = tx.closed() => break,
            next = source.next() => next,
        };

        match next {
            Some(Ok(value)) => {
                if let Some(synthesis) = pending.take() {
                    synthesis.cancel().await;
                }
                if tx.send(Ok(value.clone())).is_err() {
                    break;
                }
                let token = CancellationToken::new();
                let handle = tokio::spawn(synthesize(
                    value,
                    config,
                    Arc::clone(&extrapolator),
                    tx.clone(),
                    token.clone(),
                ));
                pending = Some(Synthesis { token, handle });
            }
            Some(Err(error)) => {
                if let Some(synthesis) = pending.take() {
                    synthesis.cancel().await;
                }
                let _ = tx.send(Err(error));
                break;
            }
            None => {
                if let Some(synthesis) = pending.take() {
                    tokio::select! {
                        _ = tx.closed() => synthesis.token.cancel(),
                        _ = synthesis.handle => {}
                    }
                }
                return;
            }
        }
    }

    if let Some(synthesis) = pending.take() {
        synthesis.cancel().await;
    }
}

async fn synthesize<T, E, F>(
    last: T,
    config: ExtrapolationConfig,
    extrapolator: Arc<F>,
    tx: mpsc::UnboundedSender<Result<T, E>>,
    token: CancellationToken,
) where
    F: Fn(&T, Duration) -> T,
{
    if config.interval.is_zero() {
        return;
    }

    let start = Instant::now();
    let mut elapsed = config.interval;
    while elapsed <= config.max_time {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = sleep_until(start + elapsed) => {}
        }
        if tx.send(Ok(extrapolator(&last, elapsed))).is_err() {
            return;
        }
        elapsed += config.interval;
    }
}
