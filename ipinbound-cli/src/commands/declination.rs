//! `declination`: evaluate the magnetic model at a position.

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use ipinbound::config::ConfigFile;
use ipinbound::magnetic::MagneticModel;

use super::common::check_coordinate;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DeclinationArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Altitude above the WGS-84 ellipsoid in meters
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub alt: f64,

    /// Date as YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,
}

pub fn run(args: DeclinationArgs) -> Result<(), CliError> {
    check_coordinate(args.lat, args.lon)?;
    let date = match &args.date {
        Some(text) => parse_date(text)?,
        None => Utc::now(),
    };

    let config = ConfigFile::load()?;
    let model = config.magnetic_model()?;

    print!("{}", report(&model, &args, date));
    if !model.is_valid_for(date) {
        eprintln!(
            "Warning: {} is outside the validity window of {}; values may be inaccurate",
            date.date_naive(),
            model.name()
        );
    }
    Ok(())
}

fn report(model: &MagneticModel, args: &DeclinationArgs, date: DateTime<Utc>) -> String {
    let field = model.field(args.lat, args.lon, args.alt, date);
    format!(
        "Model:          {} (epoch {:.1})\n\
         Date:           {}\n\
         Position:       {:.6}, {:.6} at {:.0} m\n\
         Declination:    {:.2}° {}\n\
         Inclination:    {:.2}°\n\
         Total field:    {:.0} nT\n\
         Horizontal:     {:.0} nT\n",
        model.name(),
        model.epoch(),
        date.date_naive(),
        args.lat,
        args.lon,
        args.alt,
        field.declination.abs(),
        if field.declination >= 0.0 { "E" } else { "W" },
        field.inclination,
        field.total_intensity,
        field.horizontal_intensity,
    )
}

fn parse_date(text: &str) -> Result<DateTime<Utc>, CliError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| {
            CliError::InvalidArgument(format!("date must be YYYY-MM-DD, got '{text}'"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let date = parse_date("2022-06-15").unwrap();
        assert_eq!(date.to_rfc3339(), "2022-06-15T00:00:00+00:00");
        assert!(parse_date("15/06/2022").is_err());
    }

    #[test]
    fn test_report_names_hemisphere() {
        let model = MagneticModel::bundled().unwrap();
        let date = parse_date("2026-01-01").unwrap();
        let args = DeclinationArgs {
            lat: 36.77,
            lon: -115.45,
            alt: 0.0,
            date: None,
        };
        // Nevada declination is east
        let text = report(&model, &args, date);
        assert!(text.contains("° E"), "{text}");
        assert!(text.contains("WMM-2025"));
    }
}
