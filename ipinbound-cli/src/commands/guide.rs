//! `guide`: live run-in guidance from the simulator feed.
//!
//! There is no platform positioning source on the desktop, so the live side
//! of the location service is a static "no fix" provider and all positions
//! come from simulator datagrams.

use std::time::{Duration, Instant};

use chrono::Utc;
use clap::Args;
use futures::StreamExt;
use ipinbound::guidance::{GuidanceSnapshot, LegSnapshot, TimingStatus};
use ipinbound::location::{LocationService, StaticLocationProvider};
use tracing::{info, warn};

use super::common::{parse_tot, TargetArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct GuideArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Time on target: RFC 3339 (2024-05-01T18:30:00Z) or +MINUTES from now
    #[arg(long)]
    pub tot: String,

    /// UDP port to listen on for simulator data (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Print one JSON object per line instead of text
    #[arg(long)]
    pub json: bool,

    /// Minimum milliseconds between printed snapshots
    #[arg(long, default_value_t = 1000)]
    pub every: u64,
}

pub fn run(args: GuideArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    runner.log_startup("guide");

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    runtime.block_on(guide(args, &runner))
}

async fn guide(args: GuideArgs, runner: &CliRunner) -> Result<(), CliError> {
    let config = runner.config();
    let model = config.magnetic_model()?;

    let mut target = args.target.to_target(config, &model)?;
    target.set_time_on_target(Some(parse_tot(&args.tot, Utc::now())?));
    let guidance = config.to_guidance_config();

    let mut service_config = config.to_service_config();
    service_config.simulator_enabled = true;
    if let Some(port) = args.port {
        service_config.simulator.port = port;
    }
    let port = service_config.simulator.port;

    info!(
        target_position = ?target.coordinate(),
        ip = ?target.ip_coordinate(),
        tot = ?target.time_on_target(),
        "Guidance target set"
    );

    let service = LocationService::new(StaticLocationProvider::no_fix(), service_config);
    let mut subscription = service.subscribe().await;

    match service.simulator_address().await {
        Some(address) => eprintln!("Listening for simulator data on {address} (Ctrl-C to stop)"),
        None => {
            subscription.close().await;
            return Err(CliError::SimulatorUnavailable { port });
        }
    }

    let every = Duration::from_millis(args.every);
    let mut last_print: Option<Instant> = None;
    let mut waiting = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            next = subscription.next() => {
                let event = match next {
                    None => break Ok(()),
                    Some(Err(e)) => break Err(CliError::from(e)),
                    Some(Ok(event)) => event,
                };

                let Some(snapshot) = GuidanceSnapshot::compute(&event, &target, &guidance) else {
                    if !waiting {
                        eprintln!("Waiting for position data...");
                        waiting = true;
                    }
                    continue;
                };
                waiting = false;

                if last_print.is_some_and(|printed| printed.elapsed() < every) {
                    continue;
                }
                last_print = Some(Instant::now());

                if args.json {
                    match serde_json::to_string(&snapshot) {
                        Ok(line) => println!("{line}"),
                        Err(e) => break Err(CliError::from(e)),
                    }
                } else {
                    println!("{}", render_line(&snapshot));
                }
            }
        }
    };

    if let Err(e) = &result {
        warn!(error = %e, "Guidance stopped");
    }
    subscription.close().await;
    info!("Guidance stopped");
    result
}

/// One human-readable line per snapshot.
fn render_line(snapshot: &GuidanceSnapshot) -> String {
    let source = snapshot.sim_name.as_deref().unwrap_or("GPS");
    let mut line = format!(
        "{} [{}] {}",
        snapshot.timestamp.format("%H:%M:%SZ"),
        source,
        snapshot.mode
    );

    if let Some(speed) = snapshot.ground_speed_kt {
        line.push_str(&format!("  GS {speed:.0} kt"));
    }
    if let Some(track) = snapshot.track_magnetic_deg {
        line.push_str(&format!(" TRK {track:03.0}°M"));
    }

    let leg = if snapshot.mode.is_to_ip() {
        snapshot.to_ip.as_ref().map(|leg| ("IP", leg))
    } else if snapshot.mode.is_to_target() {
        snapshot.to_target.as_ref().map(|leg| ("TGT", leg))
    } else {
        None
    };
    if let Some((name, leg)) = leg {
        line.push_str(&format!(" | {name} {}", render_leg(leg)));
    }

    if let Some(tot) = snapshot.time_on_target {
        let remaining = (tot - snapshot.timestamp).num_seconds();
        line.push_str(&format!(" | TOT {}", countdown(remaining)));
    }

    line.push_str(&format!(
        " | XTK {:.2} NM {}",
        snapshot.cross_track_nm.abs(),
        if snapshot.cross_track_nm >= 0.0 { "L" } else { "R" }
    ));

    if let Some(timing) = snapshot.timing {
        line.push_str(&format!(" | {}", timing_label(timing)));
    }
    line
}

fn render_leg(leg: &LegSnapshot) -> String {
    let mut text = format!("{:03.0}°M {:.1} NM", leg.bearing_magnetic_deg, leg.distance_nm);
    if let Some(delta) = leg.delta_tot_secs {
        text.push_str(&format!(" Δ{delta:+.0}s"));
    }
    text
}

fn countdown(seconds: i64) -> String {
    let sign = if seconds < 0 { "+" } else { "-" };
    let seconds = seconds.abs();
    format!("{sign}{}:{:02}", seconds / 60, seconds % 60)
}

fn timing_label(timing: TimingStatus) -> &'static str {
    match timing {
        TimingStatus::OnTime => "ON TIME",
        TimingStatus::EarlyCaution => "EARLY",
        TimingStatus::EarlyWarning => "EARLY!",
        TimingStatus::LateCaution => "LATE",
        TimingStatus::LateWarning => "LATE!",
    }
}
