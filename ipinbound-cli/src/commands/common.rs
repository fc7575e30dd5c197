//! Argument groups and helpers shared across CLI commands.

use chrono::{DateTime, Duration, Utc};
use clap::Args;
use ipinbound::config::ConfigFile;
use ipinbound::geo::Coordinate;
use ipinbound::magnetic::MagneticModel;
use ipinbound::target::{OffsetType, Target};

use crate::error::CliError;

/// Target position and IP offset.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Target latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Target longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Bearing from the target to the IP in degrees (magnetic unless --true)
    #[arg(long)]
    pub bearing: f64,

    /// Treat --bearing as a true bearing
    #[arg(long = "true")]
    pub true_bearing: bool,

    /// IP distance from the target in nautical miles
    #[arg(long, conflicts_with = "time")]
    pub distance: Option<f64>,

    /// IP offset as run-in time in minutes
    #[arg(long)]
    pub time: Option<f64>,

    /// Planned run-in ground speed in knots (default from config)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Target name
    #[arg(long, default_value = "Target")]
    pub name: String,
}

impl TargetArgs {
    /// Build a target, filling unset values from the config defaults.
    pub fn to_target(&self, config: &ConfigFile, model: &MagneticModel) -> Result<Target, CliError> {
        check_coordinate(self.lat, self.lon)?;
        if !self.bearing.is_finite() {
            return Err(CliError::InvalidArgument(format!(
                "bearing must be a number of degrees, got {}",
                self.bearing
            )));
        }

        let mut defaults = config.to_target_defaults();
        if let Some(speed) = self.speed {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(CliError::InvalidArgument(format!(
                    "speed must be positive, got {speed}"
                )));
            }
            defaults.ground_speed_kt = speed;
        }

        let mut target = Target::new(
            self.name.clone(),
            Coordinate::new(self.lat, self.lon),
            &defaults,
            model,
        );
        target.set_offset_bearing(self.bearing, self.true_bearing);

        match (self.distance, self.time) {
            (Some(nm), _) => {
                check_offset(nm, "distance")?;
                target.set_offset_type(OffsetType::Distance);
                target.set_offset_distance(nm);
            }
            (None, Some(minutes)) => {
                check_offset(minutes, "time")?;
                target.set_offset_type(OffsetType::Time);
                target.set_offset_time(minutes);
            }
            (None, None) => {}
        }

        Ok(target)
    }
}

pub fn check_coordinate(lat: f64, lon: f64) -> Result<(), CliError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(CliError::InvalidArgument(format!(
            "latitude must be between -90 and 90, got {lat}"
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(CliError::InvalidArgument(format!(
            "longitude must be between -180 and 180, got {lon}"
        )));
    }
    Ok(())
}

fn check_offset(value: f64, name: &str) -> Result<(), CliError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CliError::InvalidArgument(format!(
            "{name} must be zero or positive, got {value}"
        )))
    }
}

/// Parse a time on target: an RFC 3339 instant, or `+MIN` minutes from `now`.
pub fn parse_tot(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, CliError> {
    let value = value.trim();
    if let Some(minutes) = value.strip_prefix('+') {
        let minutes: f64 = minutes.parse().map_err(|_| invalid_tot(value))?;
        if !(minutes.is_finite() && minutes >= 0.0) {
            return Err(invalid_tot(value));
        }
        let offset = Duration::try_milliseconds((minutes * 60_000.0).round() as i64)
            .ok_or_else(|| invalid_tot(value))?;
        return now.checked_add_signed(offset).ok_or_else(|| invalid_tot(value));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|tot| tot.with_timezone(&Utc))
        .map_err(|_| invalid_tot(value))
}

fn invalid_tot(value: &str) -> CliError {
    CliError::InvalidArgument(format!(
        "time on target must be RFC 3339 (2024-05-01T18:30:00Z) or +MINUTES, got '{value}'"
    ))
}
