//! Command-line interface for drivecontrol.
//!
//! This module provides the CLI structure for the `drivectl` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AccountCommand, CategoryArg, ChartCommand, ConfigCommand, FuelAddArgs, FuelCommand,
    FuelEditArgs, FuelTypeArg, MaintenanceAddArgs, MaintenanceCommand, MaintenanceEditArgs,
    OutputFormat, ServiceKindArg, StatsCommand, StatusCommand, VehicleAddArgs, VehicleCommand,
    VehicleEditArgs,
};

use crate::logging::Verbosity;

/// drivectl - Track what your vehicles cost you
///
/// Log fill-ups and maintenance per vehicle, see totals and fuel efficiency
/// trends, and get short tips on which fuel is paying off.
#[derive(Debug, Parser)]
#[command(name = "drivectl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register, log in and manage accounts
    #[command(subcommand)]
    Account(AccountCommand),

    /// Manage vehicles
    #[command(subcommand)]
    Vehicle(VehicleCommand),

    /// Manage fill-ups
    #[command(subcommand)]
    Fuel(FuelCommand),

    /// Manage maintenance records
    #[command(subcommand, visible_alias = "maint")]
    Maintenance(MaintenanceCommand),

    /// Show spending and efficiency statistics
    Stats(StatsCommand),

    /// Show efficiency and price over time
    Chart(ChartCommand),

    /// Ask for fuel tips about the active vehicle
    Insight,

    /// Show session and storage status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("drivectl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "drivectl");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["insight"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["-v", "insight"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["-vv", "insight"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["-q", "insight"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["-c", "/custom/config.toml", "status"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_account_register() {
        let cli = parse(&["account", "register", "Ana", "--password", "s3cret"]);
        match cli.command {
            Command::Account(AccountCommand::Register { username, password }) => {
                assert_eq!(username, "Ana");
                assert_eq!(password.as_deref(), Some("s3cret"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_vehicle_add_defaults() {
        let cli = parse(&["vehicle", "add", "Gol"]);
        match cli.command {
            Command::Vehicle(VehicleCommand::Add(args)) => {
                assert_eq!(args.name, "Gol");
                assert_eq!(args.color, crate::ledger::DEFAULT_COLOR);
                assert!(args.plate.is_empty());
                assert!(args.photo.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fuel_add() {
        let cli = parse(&[
            "fuel",
            "add",
            "--date",
            "2024-03-10",
            "--km-total",
            "15000",
            "--km-partial",
            "420.5",
            "--fuel",
            "ethanol",
            "--value",
            "180",
            "--liters",
            "40",
        ]);
        match cli.command {
            Command::Fuel(FuelCommand::Add(args)) => {
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 3, 10));
                assert_eq!(args.fuel, FuelTypeArg::Ethanol);
                assert!((args.km_partial - 420.5).abs() < f64::EPSILON);
                assert!(args.vehicle.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fuel_add_requires_amounts() {
        let result = Cli::try_parse_from(["drivectl", "fuel", "add", "--liters", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_bad_date_rejected() {
        let result = Cli::try_parse_from([
            "drivectl",
            "fuel",
            "edit",
            "abc",
            "--date",
            "10/03/2024",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_maintenance_add() {
        let cli = parse(&[
            "maint",
            "add",
            "Front pads",
            "--category",
            "brakes",
            "--km",
            "30000",
            "--value",
            "350",
            "--type",
            "corrective",
        ]);
        match cli.command {
            Command::Maintenance(MaintenanceCommand::Add(args)) => {
                assert_eq!(args.description, "Front pads");
                assert_eq!(args.category, CategoryArg::Brakes);
                assert_eq!(args.kind, ServiceKindArg::Corrective);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_stats_fleet_conflicts_with_vehicle() {
        let cli = parse(&["stats", "--fleet", "--json"]);
        assert!(matches!(
            cli.command,
            Command::Stats(StatsCommand {
                fleet: true,
                json: true,
                ..
            })
        ));
        let result = Cli::try_parse_from(["drivectl", "stats", "--fleet", "--vehicle", "Gol"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_photo_flags_conflict() {
        let result = Cli::try_parse_from([
            "drivectl",
            "vehicle",
            "edit",
            "Gol",
            "--photo",
            "car.png",
            "--clear-photo",
        ]);
        assert!(result.is_err());
    }
}
