//! UDP listener for simulator position datagrams.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, BoxStream};
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::protocol::{parse_datagram, ParseError, SimSample};

/// Default port simulators send ForeFlight data to.
pub const DEFAULT_PORT: u16 = 49002;

/// Samples buffered per subscriber before it starts lagging.
const SAMPLE_CHANNEL_CAPACITY: usize = 64;

/// Pause after a socket receive error.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Simulator receiver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimReceiverConfig {
    /// Address to bind (default: all IPv4 interfaces).
    pub bind_address: IpAddr,

    /// UDP port to listen on (default: 49002). Zero picks a free port.
    pub port: u16,

    /// Largest datagram accepted; longer ones are truncated.
    pub max_datagram_size: usize,
}

impl Default for SimReceiverConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_datagram_size: 2048,
        }
    }
}

/// Error type for the simulator receiver.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    /// Failed to bind the UDP socket.
    #[error("Failed to bind UDP socket on {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl SimulatorError {
    /// Whether the bind failed because another process holds the port.
    pub fn is_address_in_use(&self) -> bool {
        match self {
            Self::Bind { source, .. } => source.kind() == ErrorKind::AddrInUse,
        }
    }
}

struct Listener {
    token: CancellationToken,
    handle: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// Listens for simulator datagrams and publishes parsed samples.
///
/// Samples go out on a broadcast channel that outlives individual
/// listeners: subscribers keep their receiver across `stop`/`start`.
pub struct SimReceiver {
    config: SimReceiverConfig,
    samples_tx: broadcast::Sender<SimSample>,
    listener: Option<Listener>,
}

impl SimReceiver {
    pub fn new(config: SimReceiverConfig) -> Self {
        let (samples_tx, _) = broadcast::channel(SAMPLE_CHANNEL_CAPACITY);
        Self {
            config,
            samples_tx,
            listener: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SimReceiverConfig::default())
    }

    /// Get the configured port.
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Address of the bound socket, while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|listener| listener.local_addr)
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Start listening, replacing any existing listener.
    ///
    /// A bind failure is logged and leaves the receiver idle; simulator data
    /// is optional. Returns whether a socket is now bound.
    pub async fn start(&mut self) -> bool {
        match self.try_start().await {
            Ok(_) => true,
            Err(e) if e.is_address_in_use() => {
                warn!(
                    port = self.config.port,
                    "Port already in use. Simulator data will not be available."
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to start simulator receiver");
                false
            }
        }
    }

    /// Start listening, replacing any existing listener, and report bind
    /// failures to the caller.
    pub async fn try_start(&mut self) -> Result<SocketAddr, SimulatorError> {
        self.stop().await;

        let address = SocketAddr::new(self.config.bind_address, self.config.port);
        let socket = UdpSocket::bind(address)
            .await
            .map_err(|source| SimulatorError::Bind { address, source })?;
        let local_addr = socket.local_addr().unwrap_or(address);

        info!(port = local_addr.port(), local_addr = %local_addr, "Simulator receiver started");

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(
            socket,
            self.samples_tx.clone(),
            token.clone(),
            self.config.max_datagram_size,
        ));
        self.listener = Some(Listener {
            token,
            handle,
            local_addr,
        });
        Ok(local_addr)
    }

    /// Close the socket and wait for the listener task to finish.
    pub async fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.token.cancel();
            if let Err(e) = listener.handle.await {
                warn!(error = %e, "Simulator receiver task failed");
            }
        }
    }

    /// Subscribe to parsed samples.
    pub fn subscribe(&self) -> broadcast::Receiver<SimSample> {
        self.samples_tx.subscribe()
    }

    /// Parsed samples as a stream. Samples missed by a slow reader are
    /// skipped.
    pub fn samples(&self) -> BoxStream<'static, SimSample> {
        Box::pin(stream::unfold(self.subscribe(), |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(sample) => return Some((sample, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Simulator sample reader lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }))
    }
}

async fn run(
    socket: UdpSocket,
    samples_tx: broadcast::Sender<SimSample>,
    token: CancellationToken,
    max_datagram_size: usize,
) {
    let mut buffer = vec![0u8; max_datagram_size];
    let mut datagrams_received: u64 = 0;
    let mut samples_sent: u64 = 0;

    loop {
        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = socket.recv_from(&mut buffer) => result,
        };

        match result {
            Ok((len, peer)) => {
                datagrams_received += 1;
                let data = &buffer[..len];
                log_first_datagram(datagrams_received, data, peer);

                match parse_datagram(data, Utc::now()) {
                    Ok(sample) => {
                        samples_sent += 1;
                        log_sample(&sample, samples_sent);
                        // No subscribers is fine
                        let _ = samples_tx.send(sample);
                    }
                    Err(ParseError::UnrecognizedTag) => {
                        trace!(len, "Ignoring non-XGPS datagram");
                    }
                    Err(e) => {
                        let preview = String::from_utf8_lossy(&data[..len.min(80)]);
                        debug!(error = %e, preview = %preview, "Dropping malformed simulator datagram");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "UDP receive error");
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(RECV_ERROR_BACKOFF) => {}
                }
            }
        }
    }

    info!(datagrams_received, samples_sent, "Simulator receiver stopped");
}

fn log_first_datagram(datagrams_received: u64, data: &[u8], peer: SocketAddr) {
    if datagrams_received == 1 {
        let header = String::from_utf8_lossy(&data[..data.len().min(4)]);
        info!(
            peer = %peer,
            header = %header,
            len = data.len(),
            "Received first simulator datagram"
        );
    }
}

fn log_sample(sample: &SimSample, samples_sent: u64) {
    if samples_sent == 1 {
        info!(
            sim = %sample.sim_name,
            lat = format!("{:.4}", sample.latitude),
            lon = format!("{:.4}", sample.longitude),
            trk = format!("{:.0}", sample.track_true_deg),
            gs_mps = format!("{:.1}", sample.ground_speed_mps),
            "First simulator position"
        );
    } else {
        trace!(
            lat = format!("{:.4}", sample.latitude),
            lon = format!("{:.4}", sample.longitude),
            "Simulator position #{}",
            samples_sent
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn loopback_config(port: u16) -> SimReceiverConfig {
        SimReceiverConfig {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            ..Default::default()
        }
    }

    async fn send(to: SocketAddr, payload: &[u8]) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.send_to(payload, to).await.unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = SimReceiverConfig::default();
        assert_eq!(config.port, 49002);
        assert_eq!(config.max_datagram_size, 2048);
        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[tokio::test]
    async fn test_receives_samples() {
        let mut receiver = SimReceiver::new(loopback_config(0));
        let mut samples = receiver.samples();
        let addr = receiver.try_start().await.unwrap();
        assert!(receiver.is_listening());

        send(addr, b"XGPSTest,-122.0,37.0,100,90,50").await;

        let sample = tokio::time::timeout(Duration::from_secs(2), samples.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sample.sim_name, "Test");
        assert_eq!(sample.latitude, 37.0);

        receiver.stop().await;
        assert!(!receiver.is_listening());
    }

    #[tokio::test]
    async fn test_malformed_datagrams_are_dropped() {
        let mut receiver = SimReceiver::new(loopback_config(0));
        let mut rx = receiver.subscribe();
        let addr = receiver.try_start().await.unwrap();

        send(addr, b"XGPSTest,-122.0,37.0,100,90").await;
        send(addr, b"XATTTest,90,0,0").await;
        send(addr, b"XGPSTest,-122.0,abc,100,90,50").await;
        send(addr, b"XGPSGood,-115.0,36.0,1500,179,31").await;

        let sample = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sample.sim_name, "Good");
        receiver.stop().await;
    }

    #[tokio::test]
    async fn test_port_in_use_leaves_receiver_idle() {
        let blocker = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = blocker.local_addr().unwrap().port();

        let mut receiver = SimReceiver::new(loopback_config(port));
        let error = receiver.try_start().await.unwrap_err();
        assert!(error.is_address_in_use());

        assert!(!receiver.start().await);
        assert!(!receiver.is_listening());
        assert!(receiver.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_restart_rebinds_same_port() {
        let mut receiver = SimReceiver::new(loopback_config(0));
        let first = receiver.try_start().await.unwrap();

        let mut fixed = SimReceiver::new(loopback_config(first.port()));
        receiver.stop().await;

        assert!(fixed.start().await);
        // Starting again tears down the existing listener before binding
        assert!(fixed.start().await);
        assert_eq!(fixed.local_addr().map(|a| a.port()), Some(first.port()));
        fixed.stop().await;
    }

    #[tokio::test]
    async fn test_subscription_survives_restart() {
        let mut receiver = SimReceiver::new(loopback_config(0));
        let mut samples = receiver.samples();

        receiver.try_start().await.unwrap();
        receiver.stop().await;
        let addr = receiver.try_start().await.unwrap();

        send(addr, b"XGPSAgain,1,2,3,4,5").await;
        let sample = tokio::time::timeout(Duration::from_secs(2), samples.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sample.sim_name, "Again");
        receiver.stop().await;
    }
}
