//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::ledger::{FuelType, MaintenanceCategory, ServiceKind, DEFAULT_COLOR};

/// Account commands.
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create an account and log into it
    Register {
        /// Username (unique, case-insensitive)
        username: String,

        /// Password; omit for a password-less account
        #[arg(short, long, env = "DRIVECTL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log into an existing account
    Login {
        /// Username
        username: String,

        /// Password, if the account has one
        #[arg(short, long, env = "DRIVECTL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out of the current account
    Logout,

    /// Show the logged-in account
    Whoami {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Rename the account or change its photo
    Update {
        /// New username
        #[arg(long)]
        username: Option<String>,

        /// Image file to use as profile photo
        #[arg(long, value_name = "FILE")]
        photo: Option<PathBuf>,

        /// Remove the profile photo
        #[arg(long, conflicts_with = "photo")]
        clear_photo: bool,
    },

    /// List registered accounts
    List,
}

/// Vehicle commands.
#[derive(Debug, Subcommand)]
pub enum VehicleCommand {
    /// Add a vehicle and select it
    Add(VehicleAddArgs),

    /// List vehicles
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Edit a vehicle's attributes
    Edit(VehicleEditArgs),

    /// Delete a vehicle and all its entries
    Remove {
        /// Vehicle name, id or id prefix
        vehicle: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Select the active vehicle
    Select {
        /// Vehicle name, id or id prefix
        vehicle: String,
    },

    /// Show the preset identification colors
    Colors,
}

/// Arguments for `vehicle add`.
#[derive(Debug, Args)]
pub struct VehicleAddArgs {
    /// Display name
    pub name: String,

    /// License plate
    #[arg(long, default_value = "")]
    pub plate: String,

    /// Model and year
    #[arg(long, default_value = "")]
    pub model: String,

    /// Identification color (#rgb or #rrggbb)
    #[arg(long, default_value = DEFAULT_COLOR)]
    pub color: String,

    /// Image file to use as the vehicle photo
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,
}

/// Arguments for `vehicle edit`. Omitted fields are left unchanged.
#[derive(Debug, Args)]
pub struct VehicleEditArgs {
    /// Vehicle name, id or id prefix
    pub vehicle: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New license plate
    #[arg(long)]
    pub plate: Option<String>,

    /// New model and year
    #[arg(long)]
    pub model: Option<String>,

    /// New identification color
    #[arg(long)]
    pub color: Option<String>,

    /// Image file to use as the vehicle photo
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Remove the vehicle photo
    #[arg(long, conflicts_with = "photo")]
    pub clear_photo: bool,
}

/// Fuel entry commands.
#[derive(Debug, Subcommand)]
pub enum FuelCommand {
    /// Record a fill-up
    Add(FuelAddArgs),

    /// Edit a fill-up; derived values are recomputed
    Edit(FuelEditArgs),

    /// Delete a fill-up
    Remove {
        /// Entry id or id prefix
        entry: String,

        /// Vehicle (defaults to the active one)
        #[arg(long)]
        vehicle: Option<String>,
    },

    /// List fill-ups, most recent first
    List {
        /// Vehicle (defaults to the active one)
        #[arg(long)]
        vehicle: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Arguments for `fuel add`.
#[derive(Debug, Args)]
pub struct FuelAddArgs {
    /// Vehicle (defaults to the active one)
    #[arg(long)]
    pub vehicle: Option<String>,

    /// Day of the fill-up, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Odometer reading at the pump
    #[arg(long)]
    pub km_total: f64,

    /// Distance driven since the previous fill-up
    #[arg(long)]
    pub km_partial: f64,

    /// Fuel bought
    #[arg(long, value_enum, default_value = "gasoline")]
    pub fuel: FuelTypeArg,

    /// Amount paid
    #[arg(long)]
    pub value: f64,

    /// Liters bought
    #[arg(long)]
    pub liters: f64,
}

/// Arguments for `fuel edit`. Omitted fields are left unchanged.
#[derive(Debug, Args)]
pub struct FuelEditArgs {
    /// Entry id or id prefix
    pub entry: String,

    /// Vehicle (defaults to the active one)
    #[arg(long)]
    pub vehicle: Option<String>,

    /// Day of the fill-up
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Odometer reading at the pump
    #[arg(long)]
    pub km_total: Option<f64>,

    /// Distance driven since the previous fill-up
    #[arg(long)]
    pub km_partial: Option<f64>,

    /// Fuel bought
    #[arg(long, value_enum)]
    pub fuel: Option<FuelTypeArg>,

    /// Amount paid
    #[arg(long)]
    pub value: Option<f64>,

    /// Liters bought
    #[arg(long)]
    pub liters: Option<f64>,
}

/// Maintenance entry commands.
#[derive(Debug, Subcommand)]
pub enum MaintenanceCommand {
    /// Record a maintenance event
    Add(MaintenanceAddArgs),

    /// Edit a maintenance event
    Edit(MaintenanceEditArgs),

    /// Delete a maintenance event
    Remove {
        /// Entry id or id prefix
        entry: String,

        /// Vehicle (defaults to the active one)
        #[arg(long)]
        vehicle: Option<String>,
    },

    /// List maintenance events, most recent first
    List {
        /// Vehicle (defaults to the active one)
        #[arg(long)]
        vehicle: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

/// Arguments for `maintenance add`.
#[derive(Debug, Args)]
pub struct MaintenanceAddArgs {
    /// What was done
    pub description: String,

    /// Vehicle (defaults to the active one)
    #[arg(long)]
    pub vehicle: Option<String>,

    /// Day of the service (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Service category
    #[arg(long, value_enum, default_value = "other")]
    pub category: CategoryArg,

    /// Odometer reading at the time of service
    #[arg(long)]
    pub km: f64,

    /// Amount paid
    #[arg(long)]
    pub value: f64,

    /// Preventive or corrective
    #[arg(long = "type", value_enum, default_value = "preventive")]
    pub kind: ServiceKindArg,
}

/// Arguments for `maintenance edit`. Omitted fields are left unchanged.
#[derive(Debug, Args)]
pub struct MaintenanceEditArgs {
    /// Entry id or id prefix
    pub entry: String,

    /// Vehicle (defaults to the active one)
    #[arg(long)]
    pub vehicle: Option<String>,

    /// What was done
    #[arg(long)]
    pub description: Option<String>,

    /// Day of the service
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Service category
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Odometer reading at the time of service
    #[arg(long)]
    pub km: Option<f64>,

    /// Amount paid
    #[arg(long)]
    pub value: Option<f64>,

    /// Preventive or corrective
    #[arg(long = "type", value_enum)]
    pub kind: Option<ServiceKindArg>,
}

/// Statistics command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Vehicle (defaults to the active one)
    #[arg(long, conflicts_with = "fleet")]
    pub vehicle: Option<String>,

    /// Summarize every vehicle instead of one
    #[arg(long)]
    pub fleet: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Chart command arguments.
#[derive(Debug, Args)]
pub struct ChartCommand {
    /// Vehicle (defaults to the active one)
    #[arg(long)]
    pub vehicle: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Fuel type argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FuelTypeArg {
    /// Gasoline
    Gasoline,
    /// Ethanol
    Ethanol,
}

impl From<FuelTypeArg> for FuelType {
    fn from(arg: FuelTypeArg) -> Self {
        match arg {
            FuelTypeArg::Gasoline => Self::Gasoline,
            FuelTypeArg::Ethanol => Self::Ethanol,
        }
    }
}

/// Maintenance category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// Oil change
    OilChange,
    /// Tires
    Tires,
    /// Brakes
    Brakes,
    /// Suspension
    Suspension,
    /// Engine
    Engine,
    /// Electrical system
    Electrical,
    /// Filters
    Filters,
    /// Air conditioning
    AirConditioning,
    /// Cleaning and cosmetic work
    Cosmetic,
    /// Anything else
    Other,
}

impl From<CategoryArg> for MaintenanceCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::OilChange => Self::OilChange,
            CategoryArg::Tires => Self::Tires,
            CategoryArg::Brakes => Self::Brakes,
            CategoryArg::Suspension => Self::Suspension,
            CategoryArg::Engine => Self::Engine,
            CategoryArg::Electrical => Self::Electrical,
            CategoryArg::Filters => Self::Filters,
            CategoryArg::AirConditioning => Self::AirConditioning,
            CategoryArg::Cosmetic => Self::Cosmetic,
            CategoryArg::Other => Self::Other,
        }
    }
}

/// Service kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKindArg {
    /// Scheduled service
    Preventive,
    /// Repair after a failure
    Corrective,
}

impl From<ServiceKindArg> for ServiceKind {
    fn from(arg: ServiceKindArg) -> Self {
        match arg {
            ServiceKindArg::Preventive => Self::Preventive,
            ServiceKindArg::Corrective => Self::Corrective,
        }
    }
}

/// Output format for list commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}
