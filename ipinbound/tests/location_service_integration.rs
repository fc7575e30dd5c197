//! Integration tests for the fused location service.
//!
//! These tests run the real pipeline: a hand-fed live provider plus a
//! simulator listener on an ephemeral loopback port.
//! - Live fixes reach subscribers
//! - Simulator datagrams preempt the live feed, then go stale
//! - Teardown releases the UDP port
//!
//! Run with: `cargo test --test location_service_integration`

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use ipinbound::geo::Coordinate;
use ipinbound::location::{
    ChannelLocationProvider, LocationError, LocationEvent, LocationFix, LocationService,
    LocationServiceConfig, LocationSubscription,
};
use ipinbound::simulator::SimReceiverConfig;
use ipinbound::stream::ExtrapolationConfig;

// ============================================================================
// Test Helpers
// ============================================================================

const WAIT: Duration = Duration::from_secs(5);

fn config(port: u16) -> LocationServiceConfig {
    LocationServiceConfig {
        live: ExtrapolationConfig::new(Duration::from_secs(30), Duration::from_millis(50)),
        simulator_priority_timeout: Duration::from_millis(400),
        simulator_interval: Duration::from_millis(50),
        simulator_enabled: true,
        simulator: SimReceiverConfig {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            ..Default::default()
        },
    }
}

fn live_fix() -> LocationEvent {
    LocationEvent::from_fix(
        LocationFix::new(Coordinate::new(36.1, -115.1), Utc::now()).with_motion(90.0, 40.0),
    )
}

async fn send_datagram(to: SocketAddr, payload: &str) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.send_to(payload.as_bytes(), to).await.unwrap();
}

/// Read events until one satisfies `predicate`.
async fn next_matching(
    subscription: &mut LocationSubscription,
    predicate: impl Fn(&LocationEvent) -> bool,
) -> LocationEvent {
    timeout(WAIT, async {
        loop {
            match subscription.next().await {
                Some(Ok(event)) if predicate(&event) => return event,
                Some(Ok(_)) => continue,
                other => panic!("stream ended early: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a matching event")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_live_fix_reaches_subscriber() {
    let provider = ChannelLocationProvider::new();
    let service = LocationService::new(provider.clone(), config(0));
    let mut subscription = service.subscribe().await;

    provider.send(live_fix());
    let event = next_matching(&mut subscription, |e| e.fix.is_some()).await;
    assert!(!event.is_simulating());

    subscription.close().await;
    assert!(!service.is_running().await);
}

#[tokio::test]
async fn test_simulator_preempts_then_falls_back_to_live() {
    let provider = ChannelLocationProvider::new();
    let service = LocationService::new(provider.clone(), config(0));
    let mut subscription = service.subscribe().await;
    let sim_addr = service.simulator_address().await.expect("simulator bound");

    provider.send(live_fix());
    next_matching(&mut subscription, |e| !e.is_simulating()).await;

    send_datagram(sim_addr, "XGPSTestSim,-115.2,36.2,1500,180,50").await;
    let sim = next_matching(&mut subscription, LocationEvent::is_simulating).await;
    assert_eq!(sim.sim_name.as_deref(), Some("TestSim"));
    let coordinate = sim.coordinate().unwrap();
    assert!((coordinate.latitude - 36.2).abs() < 0.01);

    // Once the simulator goes quiet past its priority window, live returns
    let live = next_matching(&mut subscription, |e| !e.is_simulating()).await;
    assert!(live.fix.is_some());

    subscription.close().await;
}

#[tokio::test]
async fn test_subscribers_share_one_pipeline() {
    let provider = ChannelLocationProvider::new();
    let service = LocationService::new(provider.clone(), config(0));

    let mut first = service.subscribe().await;
    let mut second = service.subscribe().await;
    assert_eq!(service.subscriber_count().await, 2);
    assert_eq!(provider.open_streams(), 1);

    provider.send(live_fix());
    next_matching(&mut first, |e| e.fix.is_some()).await;
    next_matching(&mut second, |e| e.fix.is_some()).await;

    // Closing one view leaves the other flowing
    first.close().await;
    assert!(service.is_running().await);
    provider.send(live_fix());
    next_matching(&mut second, |e| e.fix.is_some()).await;

    second.close().await;
    assert!(!service.is_running().await);
}

#[tokio::test]
async fn test_live_failure_reaches_every_subscriber() {
    let provider = ChannelLocationProvider::new();
    let service = LocationService::new(provider.clone(), config(0));
    let mut first = service.subscribe().await;
    let mut second = service.subscribe().await;

    provider.fail(LocationError::Unavailable("antenna".to_string()));

    for subscription in [&mut first, &mut second] {
        let result = timeout(WAIT, async {
            loop {
                match subscription.next().await {
                    Some(Ok(_)) => continue,
                    other => return other,
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(
            result,
            Some(Err(LocationError::Unavailable("antenna".to_string())))
        );
    }

    first.close().await;
    second.close().await;
}

#[tokio::test]
async fn test_teardown_releases_simulator_port() {
    let provider = ChannelLocationProvider::new();
    let first_service = LocationService::new(provider.clone(), config(0));
    let subscription = first_service.subscribe().await;
    let port = first_service.simulator_address().await.unwrap().port();
    subscription.close().await;

    let second_service = LocationService::new(provider, config(port));
    let mut subscription = second_service.subscribe().await;
    assert_eq!(
        second_service.simulator_address().await.map(|a| a.port()),
        Some(port)
    );

    send_datagram(
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
        "XGPSRebound,-115.0,36.0,1000,90,60",
    )
    .await;
    let event = next_matching(&mut subscription, LocationEvent::is_simulating).await;
    assert_eq!(event.sim_name.as_deref(), Some("Rebound"));

    subscription.close().await;
}

#[tokio::test]
async fn test_port_in_use_still_serves_live_fixes() {
    let blocker = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = blocker.local_addr().unwrap().port();

    let provider = ChannelLocationProvider::new();
    let service = LocationService::new(provider.clone(), config(port));
    let mut subscription = service.subscribe().await;
    assert!(service.simulator_address().await.is_none());

    provider.send(live_fix());
    let event = next_matching(&mut subscription, |e| e.fix.is_some()).await;
    assert!(!event.is_simulating());

    subscription.close().await;
}
