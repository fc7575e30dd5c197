//! Reference-counted fusion of the live and simulator location feeds.

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{future, stream, Stream, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{LocationError, LocationEvent, LocationProvider};
use crate::simulator::{SimReceiver, SimReceiverConfig};
use crate::stream::{
    bootstrap, combine_latest, extrapolate, Consumer, EventStream, ExtrapolationConfig, Multicast,
};

/// Timing knobs for the fused stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationServiceConfig {
    /// Extrapolation of the live feed.
    pub live: ExtrapolationConfig,

    /// How long a simulator fix takes precedence over the live feed.
    pub simulator_priority_timeout: Duration,

    /// Spacing of extrapolated simulator events.
    pub simulator_interval: Duration,

    /// Whether to listen for simulator datagrams at all.
    pub simulator_enabled: bool,

    pub simulator: SimReceiverConfig,
}

impl Default for LocationServiceConfig {
    fn default() -> Self {
        Self {
            live: ExtrapolationConfig::new(Duration::from_secs(5), Duration::from_millis(200)),
            simulator_priority_timeout: Duration::from_secs(5),
            simulator_interval: Duration::from_millis(200),
            simulator_enabled: true,
            simulator: SimReceiverConfig::default(),
        }
    }
}

/// Pick the event to surface from the latest live and simulator events.
///
/// The simulator wins while its fix was observed no more than
/// `priority_timeout` before `now`. Otherwise the live event is used, unless
/// it carries neither a fix nor an error.
pub fn select_event(
    live: &LocationEvent,
    sim: &LocationEvent,
    priority_timeout: Duration,
    now: DateTime<Utc>,
) -> Option<LocationEvent> {
    if let Some(fix) = &sim.fix {
        // A fix stamped in the future counts as fresh
        let fresh = (now - fix.observed_at)
            .to_std()
            .map_or(true, |age| age <= priority_timeout);
        if fresh {
            return Some(sim.clone());
        }
    }

    if live.fix.is_some() || live.error.is_some() {
        Some(live.clone())
    } else {
        None
    }
}

struct Pipeline {
    hub: Multicast<LocationEvent, LocationError>,
    simulator: Option<SimReceiver>,
}

impl Pipeline {
    async fn build(provider: &dyn LocationProvider, config: &LocationServiceConfig) -> Self {
        let live = extrapolate(provider.updates(), config.live, |event: &LocationEvent, _| {
            event.extrapolate_to(Utc::now())
        });

        let (simulator, sim_events) = if config.simulator_enabled {
            let mut receiver = SimReceiver::new(config.simulator.clone());
            let samples = receiver.samples();
            receiver.start().await;

            let events = samples.map(|sample| Ok(LocationEvent::from_sim(&sample)));
            let smoothed = extrapolate(
                events,
                ExtrapolationConfig::new(config.simulator_priority_timeout, config.simulator_interval),
                |event: &LocationEvent, _| event.extrapolate_to(Utc::now()),
            );
            (Some(receiver), smoothed)
        } else {
            let idle: EventStream<LocationEvent, LocationError> = stream::pending().boxed();
            (None, idle)
        };

        // The join emits nothing until both sides have, so seed the sim side
        let sim = bootstrap(sim_events, LocationEvent::empty());

        let priority_timeout = config.simulator_priority_timeout;
        let fused = combine_latest(live, sim).filter_map(move |item| {
            future::ready(match item {
                Ok((live, sim)) => select_event(&live, &sim, priority_timeout, Utc::now()).map(Ok),
                Err(error) => {
                    warn!(error = %error, "Live location source failed");
                    Some(Err(error))
                }
            })
        });

        Self {
            hub: Multicast::new(fused),
            simulator,
        }
    }

    async fn shutdown(mut self) {
        self.hub.stop();
        if let Some(mut simulator) = self.simulator.take() {
            simulator.stop().await;
        }
    }
}

#[derive(Default)]
struct State {
    subscribers: usize,
    pipeline: Option<Pipeline>,
}

struct Inner {
    provider: Box<dyn LocationProvider>,
    config: LocationServiceConfig,
    state: Mutex<State>,
}

/// Shares one fused location stream among any number of subscribers.
///
/// The pipeline (live source, simulator listener, extrapolation and the
/// broadcast hub) is built when the first reference is taken and torn down
/// when the last is released. All of that state sits behind one async
/// mutex, so concurrent `start`/`stop` calls are serialized.
#[derive(Clone)]
pub struct LocationService {
    inner: Arc<Inner>,
}

impl LocationService {
    pub fn new(provider: impl LocationProvider + 'static, config: LocationServiceConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider: Box::new(provider),
                config,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn config(&self) -> &LocationServiceConfig {
        &self.inner.config
    }

    /// Take a reference on the pipeline, building it if this is the first.
    pub async fn start(&self) {
        let mut state = self.inner.state.lock().await;
        self.retain(&mut state).await;
    }

    /// Release a reference, tearing the pipeline down if it was the last.
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        match state.subscribers {
            0 => debug!("Location service stop without a matching start"),
            1 => {
                state.subscribers = 0;
                if let Some(pipeline) = state.pipeline.take() {
                    pipeline.shutdown().await;
                }
                info!("Location pipeline stopped");
            }
            _ => state.subscribers -= 1,
        }
    }

    /// Take a reference and open a view of the fused stream. The reference
    /// is released when the subscription is closed or dropped.
    pub async fn subscribe(&self) -> LocationSubscription {
        let mut state = self.inner.state.lock().await;
        let consumer = self.retain(&mut state).await.hub.consume();
        LocationSubscription {
            consumer,
            service: Some(self.clone()),
        }
    }

    /// Number of references currently held.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.state.lock().await.subscribers
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.lock().await.pipeline.is_some()
    }

    /// Address the simulator listener is bound to, while it is listening.
    pub async fn simulator_address(&self) -> Option<SocketAddr> {
        let state = self.inner.state.lock().await;
        state
            .pipeline
            .as_ref()
            .and_then(|pipeline| pipeline.simulator.as_ref())
            .and_then(SimReceiver::local_addr)
    }

    async fn retain<'s>(&self, state: &'s mut State) -> &'s Pipeline {
        state.subscribers += 1;
        let pipeline = match state.pipeline.take() {
            Some(pipeline) => pipeline,
            None => {
                let pipeline = Pipeline::build(self.inner.provider.as_ref(), &self.inner.config).await;
                // Drain from build time so a late subscriber gets no backlog
                pipeline.hub.start();
                info!(
                    simulator = self.inner.config.simulator_enabled,
                    "Location pipeline started"
                );
                pipeline
            }
        };
        debug!(subscribers = state.subscribers, "Location service reference taken");
        state.pipeline.insert(pipeline)
    }
}

/// One subscriber's view of the fused location stream.
///
/// Yields `Ok` events until the live source fails, then the error, then
/// ends. Holds a reference on the service until closed or dropped.
pub struct LocationSubscription {
    consumer: Consumer<LocationEvent, LocationError>,
    service: Option<LocationService>,
}

impl LocationSubscription {
    /// Release this subscription's reference and wait for any teardown.
    pub async fn close(mut self) {
        if let Some(service) = self.service.take() {
            service.stop().await;
        }
    }
}

impl Stream for LocationSubscription {
    type Item = Result<LocationEvent, LocationError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.consumer).poll_next(cx)
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        let Some(service) = self.service.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { service.stop().await });
            }
            Err(_) => warn!("Location subscription dropped outside a runtime, reference not released"),
        }
    }
}
