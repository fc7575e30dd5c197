//! `ip`: compute the initial point for a target.

use chrono::Utc;
use clap::Args;
use ipinbound::config::ConfigFile;
use ipinbound::target::Target;

use super::common::{parse_tot, TargetArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct IpArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Time on target (RFC 3339 or +MINUTES) to also show the IP crossing time
    #[arg(long)]
    pub tot: Option<String>,
}

pub fn run(args: IpArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let model = config.magnetic_model()?;

    let mut target = args.target.to_target(&config, &model)?;
    if let Some(tot) = &args.tot {
        target.set_time_on_target(Some(parse_tot(tot, Utc::now())?));
    }

    print!("{}", report(&target));
    Ok(())
}

fn report(target: &Target) -> String {
    let ip = target.ip_coordinate();
    let mut text = format!(
        "Target:         {:.6}, {:.6}\n\
         IP:             {:.6}, {:.6}\n\
         Declination:    {:.1}°\n\
         Run-in track:   {:03.0}°M ({:03.0}°T)\n\
         Run-in:         {:.1} NM, {:.1} min at {:.0} kt\n",
        target.coordinate().latitude,
        target.coordinate().longitude,
        ip.latitude,
        ip.longitude,
        target.declination(),
        target.desired_track_magnetic().normalized().degrees(),
        target.desired_track_true().normalized().degrees(),
        target.offset_distance_nm(),
        target.offset_time_min(),
        target.ground_speed_kt(),
    );

    if let (Some(tot), Some(over_ip), Some(latest)) = (
        target.time_on_target(),
        target.desired_time_over_ip(),
        target.max_allowable_time_over_ip(),
    ) {
        text.push_str(&format!(
            "TOT:            {}\n\
             Over IP:        {} (latest {})\n",
            tot.format("%H:%M:%SZ"),
            over_ip.format("%H:%M:%SZ"),
            latest.format("%H:%M:%SZ"),
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use ipinbound::geo::Coordinate;
    use ipinbound::magnetic::MagneticModel;
    use ipinbound::target::TargetDefaults;

    fn target() -> Target {
        let model = MagneticModel::bundled().unwrap();
        let mut target = Target::new(
            "Range",
            Coordinate::new(36.772367, -115.453840),
            &TargetDefaults::default(),
            &model,
        );
        target.set_declination(11.0);
        target.set_offset_bearing(359.0, true);
        target.set_offset_distance(4.0);
        target
    }

    #[test]
    fn test_report_without_tot() {
        let text = report(&target());
        assert!(text.contains("Run-in:         4.0 NM, 2.0 min at 120 kt"), "{text}");
        assert!(text.contains("(179°T)"), "{text}");
        assert!(!text.contains("TOT"));
    }

    #[test]
    fn test_report_with_tot() {
        let mut target = target();
        let tot = DateTime::parse_from_rfc3339("2024-05-01T18:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        target.set_time_on_target(Some(tot));

        let text = report(&target);
        assert!(text.contains("TOT:            18:30:00Z"), "{text}");
        // 4 NM at 120 kt is a two-minute run-in
        assert!(
            text.contains("Over IP:        18:28:00Z") || text.contains("Over IP:        18:27:59Z"),
            "{text}"
        );
    }
}
