//! End-to-end guidance for a run-in on a Nellis range target.
//!
//! These tests drive the public API the way a display would: build a
//! target, turn a position into a location event, and classify it.
//!
//! Run with: `cargo test --test guidance_scenario`

use chrono::{DateTime, Duration, Utc};

use ipinbound::geo::units::knots_to_mps;
use ipinbound::geo::Coordinate;
use ipinbound::guidance::{GuidanceConfig, GuidanceMode, GuidanceSnapshot, IpTargetMath};
use ipinbound::location::{LocationEvent, LocationFix};
use ipinbound::magnetic::MagneticModel;
use ipinbound::simulator::parse_datagram;
use ipinbound::target::{Target, TargetDefaults};

// ============================================================================
// Test Helpers
// ============================================================================

const TARGET_LAT: f64 = 36.772367;
const TARGET_LON: f64 = -115.453840;

/// A point north-west of the IP, inbound.
const PRE_IP_LAT: f64 = 36.876930;
const PRE_IP_LON: f64 = -115.481479;

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T18:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn nellis_target(tot: Duration) -> Target {
    let model = MagneticModel::bundled().unwrap();
    let mut target = Target::new(
        "Range 62",
        Coordinate::new(TARGET_LAT, TARGET_LON),
        &TargetDefaults::default(),
        &model,
    );
    target.set_offset_bearing(359.0, true);
    target.set_offset_distance(4.8);
    target.set_ground_speed(120.0);
    target.set_time_on_target(Some(now() + tot));
    target
}

fn pre_ip_event() -> LocationEvent {
    LocationEvent::from_fix(
        LocationFix::new(Coordinate::new(PRE_IP_LAT, PRE_IP_LON), now())
            .with_altitude(1502.0)
            .with_motion(179.0, knots_to_mps(62.0)),
    )
}

fn mode_for(event: &LocationEvent, target: &Target) -> GuidanceMode {
    GuidanceSnapshot::compute_at(event, target, &GuidanceConfig::default(), now())
        .unwrap()
        .mode
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_pre_ip_eta_is_about_two_minutes() {
    let target = nellis_target(Duration::minutes(5));
    let event = pre_ip_event();
    let math = IpTargetMath::from_event(&event, &target).unwrap().at(now());

    let eta = (math.ip_eta().unwrap() - now()).num_seconds();
    assert!((100..130).contains(&eta), "IP ETA {eta}s");
    assert!(!math.is_past_ip());
}

#[test]
fn test_plenty_of_slack_counts_down() {
    // 10 minutes out, the IP is reached about five minutes early
    let target = nellis_target(Duration::minutes(10));
    assert_eq!(mode_for(&pre_ip_event(), &target), GuidanceMode::ToIpWithCountdown);
}

#[test]
fn test_modest_slack_gives_speed_guidance() {
    let target = nellis_target(Duration::minutes(5));
    let snapshot =
        GuidanceSnapshot::compute_at(&pre_ip_event(), &target, &GuidanceConfig::default(), now())
            .unwrap();

    assert_eq!(snapshot.mode, GuidanceMode::ToIpWithSpeedGuidance);
    let ip_delta = snapshot.ip_delta_secs.unwrap();
    assert!(ip_delta >= -60.0 && ip_delta < 0.0, "IP delta {ip_delta}s");
    assert!(snapshot.latest_ip_delta_secs.unwrap() <= 0.0);
    assert!(snapshot.timing.is_some());
}

#[test]
fn test_tot_out_of_reach_bypasses_ip() {
    let target = nellis_target(Duration::seconds(90));
    let snapshot =
        GuidanceSnapshot::compute_at(&pre_ip_event(), &target, &GuidanceConfig::default(), now())
            .unwrap();

    assert_eq!(snapshot.mode, GuidanceMode::ToTargetBypassingIp);
    assert!(snapshot.latest_ip_delta_secs.unwrap() > 0.0);
    assert!(snapshot.to_target.is_some());
}

#[test]
fn test_modes_progress_as_tot_approaches() {
    let event = pre_ip_event();
    let modes: Vec<GuidanceMode> = (3..=20)
        .rev()
        .map(|half_minutes| mode_for(&event, &nellis_target(Duration::seconds(half_minutes * 30))))
        .collect();

    let rank = |mode: &GuidanceMode| match mode {
        GuidanceMode::ToIpWithCountdown => 0,
        GuidanceMode::ToIpWithSpeedGuidance => 1,
        GuidanceMode::ToTargetBypassingIp => 2,
        other => panic!("unexpected mode {other}"),
    };
    let ranks: Vec<u8> = modes.iter().map(rank).collect();
    assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "modes {modes:?}");
    assert_eq!(ranks.first(), Some(&0));
    assert_eq!(ranks.last(), Some(&2));
    assert!(ranks.contains(&1));
}

#[test]
fn test_past_ip_steers_to_target() {
    let target = nellis_target(Duration::minutes(2));
    let inbound = target.ip_coordinate().offset_by(179.0, 1_852.0);
    let event = LocationEvent::from_fix(
        LocationFix::new(inbound, now()).with_motion(179.0, knots_to_mps(120.0)),
    );

    let snapshot =
        GuidanceSnapshot::compute_at(&event, &target, &GuidanceConfig::default(), now()).unwrap();
    assert_eq!(snapshot.mode, GuidanceMode::ToTarget);
    assert!(snapshot.past_ip);
    assert!(snapshot.cross_track_nm.abs() < 0.1);
    assert!(snapshot.timing.is_some());
}

#[test]
fn test_stationary_aircraft_only_counts_down() {
    let target = nellis_target(Duration::minutes(5));
    let parked = LocationEvent::from_fix(
        LocationFix::new(Coordinate::new(PRE_IP_LAT, PRE_IP_LON), now()).with_motion(179.0, 0.0),
    );
    assert_eq!(mode_for(&parked, &target), GuidanceMode::CountdownOnly);
}

#[test]
fn test_no_tot_only_counts_down() {
    let mut target = nellis_target(Duration::minutes(5));
    target.set_time_on_target(None);

    let snapshot =
        GuidanceSnapshot::compute_at(&pre_ip_event(), &target, &GuidanceConfig::default(), now())
            .unwrap();
    assert_eq!(snapshot.mode, GuidanceMode::CountdownOnly);
    assert!(snapshot.to_ip.is_none());
    assert!(snapshot.timing.is_none());
}

#[test]
fn test_simulator_datagram_drives_guidance() {
    let datagram = format!(
        "XGPSX-Plane 12,{PRE_IP_LON},{PRE_IP_LAT},1502,179,{}\r\n",
        knots_to_mps(62.0)
    );
    let sample = parse_datagram(datagram.as_bytes(), now()).unwrap();
    let event = LocationEvent::from_sim(&sample);

    let target = nellis_target(Duration::minutes(5));
    let snapshot =
        GuidanceSnapshot::compute_at(&event, &target, &GuidanceConfig::default(), now()).unwrap();

    assert_eq!(snapshot.sim_name.as_deref(), Some("X-Plane 12"));
    assert_eq!(snapshot.mode, GuidanceMode::ToIpWithSpeedGuidance);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["mode"], "to_ip_with_speed_guidance");
    assert_eq!(json["sim_name"], "X-Plane 12");
}
