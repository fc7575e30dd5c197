//! IP Inbound CLI - Command-line interface
//!
//! Plans timed run-ins and prints live guidance from a flight simulator.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::declination::DeclinationArgs;
use commands::guide::GuideArgs;
use commands::ip::IpArgs;

#[derive(Parser)]
#[command(name = "ipinbound")]
#[command(version = ipinbound::VERSION)]
#[command(about = "Timed IP-to-target run-in guidance", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print magnetic declination, inclination and field intensity
    Declination(DeclinationArgs),

    /// Compute the initial point, run-in track and run-in time for a target
    Ip(IpArgs),

    /// Print live guidance from simulator position data until Ctrl-C
    Guide(GuideArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Declination(args) => commands::declination::run(args),
        Commands::Ip(args) => commands::ip::run(args),
        Commands::Guide(args) => commands::guide::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_guide() {
        let cli = Cli::try_parse_from([
            "ipinbound", "guide", "--lat", "36.77", "--lon", "-115.45", "--bearing", "359",
            "--true", "--distance", "4.8", "--speed", "120", "--tot", "+10", "--json",
        ])
        .unwrap();
        let Commands::Guide(args) = cli.command else {
            panic!("expected guide");
        };
        assert_eq!(args.target.lon, -115.45);
        assert!(args.target.true_bearing);
        assert_eq!(args.tot, "+10");
        assert!(args.json);
        assert_eq!(args.port, None);
    }

    #[test]
    fn test_distance_and_time_conflict() {
        let result = Cli::try_parse_from([
            "ipinbound", "ip", "--lat", "36.77", "--lon", "-115.45", "--bearing", "359",
            "--distance", "4.8", "--time", "2",
        ]);
        assert!(result.is_err());
    }
}
