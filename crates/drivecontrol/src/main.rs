//! `drivectl` - CLI for drivecontrol
//!
//! This binary provides the command-line interface for keeping vehicle
//! ledgers, viewing statistics and asking for fuel tips.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;

use drivecontrol::cli::{
    AccountCommand, ChartCommand, Cli, Command, ConfigCommand, FuelCommand, MaintenanceCommand,
    OutputFormat, StatsCommand, VehicleCommand,
};
use drivecontrol::ledger::vehicle::{image_mime_for_extension, photo_data_url};
use drivecontrol::ledger::{
    AppState, FuelEntryInput, MaintenanceInput, Vehicle, VehicleAttrs, PRESET_COLORS,
};
use drivecontrol::{
    fleet_aggregate, init_logging, time_series, vehicle_aggregate, Config, Error, GeminiProvider,
    InsightRequester, Storage, Tracker,
};

type App = Tracker<Storage>;

const NO_ACTIVE_VEHICLE: &str =
    "no vehicle selected; pass --vehicle or run `drivectl vehicle select`";

/// Width of the efficiency bars drawn by `drivectl chart`.
const CHART_WIDTH: f64 = 30.0;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Validating a file must work even when the default config is broken
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        validate_config(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        command => {
            let storage = Storage::open(config.database_path())?;
            let mut app = Tracker::new(storage, config.accounts.clone());
            app.resume()?;
            run(&config, &mut app, command).await
        }
    }
}

async fn run(config: &Config, app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Account(cmd) => handle_account(app, cmd),
        Command::Vehicle(cmd) => handle_vehicle(app, cmd),
        Command::Fuel(cmd) => handle_fuel(app, cmd),
        Command::Maintenance(cmd) => handle_maintenance(app, cmd),
        Command::Stats(cmd) => handle_stats(app, &cmd),
        Command::Chart(cmd) => handle_chart(app, &cmd),
        Command::Insight => handle_insight(config, app).await,
        Command::Status(cmd) => handle_status(config, app, cmd.json),
        Command::Config(cmd) => handle_config(config, cmd),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn read_photo(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    Ok(photo_data_url(image_mime_for_extension(extension), &bytes))
}

/// The vehicle named by `reference`, or the active one.
fn pick_vehicle<'a>(ledger: &'a AppState, reference: Option<&str>) -> Result<&'a Vehicle> {
    let id = match reference {
        Some(reference) => ledger.resolve_vehicle(reference)?,
        None => ledger
            .active_vehicle_id
            .clone()
            .context(NO_ACTIVE_VEHICLE)?,
    };
    let vehicle = ledger
        .vehicle(&id)
        .ok_or_else(|| Error::vehicle_not_found(id.as_str()))?;
    Ok(vehicle)
}

fn handle_account(app: &mut App, cmd: AccountCommand) -> Result<()> {
    match cmd {
        AccountCommand::Register { username, password } => {
            let session = app.register(&username, password.as_deref())?;
            println!("Registered and logged in as {}.", session.profile().username);
        }
        AccountCommand::Login { username, password } => {
            let session = app.login(&username, password.as_deref())?;
            let count = session.ledger().vehicles.len();
            println!(
                "Logged in as {} ({count} vehicle{}).",
                session.profile().username,
                plural(count)
            );
        }
        AccountCommand::Logout => {
            if app.logout()? {
                println!("Logged out.");
            } else {
                println!("Not logged in.");
            }
        }
        AccountCommand::Whoami { json } => {
            let session = app.require_session()?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.profile())?);
            } else {
                let profile = session.profile();
                println!("{} ({})", profile.username, short_id(&profile.id));
                if let Some(vehicle) = session.ledger().active_vehicle() {
                    println!("Active vehicle: {}", vehicle.name);
                }
            }
        }
        AccountCommand::Update {
            username,
            photo,
            clear_photo,
        } => {
            let current = app.require_session()?.profile().clone();
            let new_username = username.unwrap_or(current.username);
            let new_photo = match (clear_photo, photo) {
                (true, _) => None,
                (false, Some(path)) => Some(read_photo(&path)?),
                (false, None) => current.photo,
            };
            let profile = app.update_profile(&new_username, new_photo)?;
            println!("Profile updated for {}.", profile.username);
        }
        AccountCommand::List => {
            let current = app.session().map(|s| s.profile().id.clone());
            for account in app.directory().list()? {
                let marker = if current.as_deref() == Some(account.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                println!(
                    "{marker} {:<24} {:<12} registered {}",
                    account.username,
                    if account.has_password() {
                        "password"
                    } else {
                        "no password"
                    },
                    account.created_at.format("%Y-%m-%d")
                );
            }
        }
    }
    Ok(())
}

fn handle_vehicle(app: &mut App, cmd: VehicleCommand) -> Result<()> {
    match cmd {
        VehicleCommand::Add(args) => {
            let photo = args.photo.as_deref().map(read_photo).transpose()?;
            let attrs = VehicleAttrs {
                name: args.name,
                plate: args.plate,
                model: args.model,
                color: args.color,
                photo,
            };
            let id = app.add_vehicle(attrs)?;
            let name = &app.ledger()?.active_vehicle().context(NO_ACTIVE_VEHICLE)?.name;
            println!("Added {name} ({}); it is now the active vehicle.", short_id(&id));
        }
        VehicleCommand::List { format } => print_vehicles(app.ledger()?, format)?,
        VehicleCommand::Edit(args) => {
            let (id, mut attrs) = {
                let vehicle = pick_vehicle(app.ledger()?, Some(args.vehicle.as_str()))?;
                (vehicle.id.clone(), vehicle.attrs())
            };
            if let Some(name) = args.name {
                attrs.name = name;
            }
            if let Some(plate) = args.plate {
                attrs.plate = plate;
            }
            if let Some(model) = args.model {
                attrs.model = model;
            }
            if let Some(color) = args.color {
                attrs.color = color;
            }
            if args.clear_photo {
                attrs.photo = None;
            } else if let Some(path) = &args.photo {
                attrs.photo = Some(read_photo(path)?);
            }
            app.update_vehicle(&id, attrs)?;
            println!("Updated vehicle {}.", short_id(&id));
        }
        VehicleCommand::Remove { vehicle, yes } => {
            let id = app.ledger()?.resolve_vehicle(&vehicle)?;
            if !yes {
                println!("This deletes the vehicle and all of its entries.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            let removed = app.remove_vehicle(&id)?;
            println!(
                "Removed {} with {} fill-up{} and {} maintenance record{}.",
                removed.name,
                removed.entries.len(),
                plural(removed.entries.len()),
                removed.maintenance_entries.len(),
                plural(removed.maintenance_entries.len())
            );
            match app.ledger()?.active_vehicle() {
                Some(active) => println!("Active vehicle: {}", active.name),
                None => println!("No vehicles left."),
            }
        }
        VehicleCommand::Select { vehicle } => {
            let id = app.ledger()?.resolve_vehicle(&vehicle)?;
            app.select_vehicle(Some(&id))?;
            println!("Active vehicle: {vehicle}");
        }
        VehicleCommand::Colors => {
            for (name, hex) in PRESET_COLORS {
                println!("{hex}  {name}");
            }
        }
    }
    Ok(())
}

fn print_vehicles(ledger: &AppState, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ledger.vehicles)?),
        OutputFormat::Plain => {
            for vehicle in &ledger.vehicles {
                println!("{}\t{}", vehicle.id, vehicle.name);
            }
        }
        OutputFormat::Table => {
            println!(
                "  {:<8}  {:<20} {:<10} {:<18} {:<8} {:>5} {:>5}",
                "ID", "NAME", "PLATE", "MODEL", "COLOR", "FUEL", "MAINT"
            );
            for vehicle in &ledger.vehicles {
                let active = ledger.active_vehicle_id.as_deref() == Some(vehicle.id.as_str());
                println!(
                    "{} {:<8}  {:<20} {:<10} {:<18} {:<8} {:>5} {:>5}",
                    if active { '*' } else { ' ' },
                    short_id(&vehicle.id),
                    vehicle.name,
                    vehicle.plate,
                    vehicle.model,
                    vehicle.color,
                    vehicle.entries.len(),
                    vehicle.maintenance_entries.len()
                );
            }
        }
    }
    Ok(())
}

fn handle_fuel(app: &mut App, cmd: FuelCommand) -> Result<()> {
    match cmd {
        FuelCommand::Add(args) => {
            let vehicle_id = pick_vehicle(app.ledger()?, args.vehicle.as_deref())?
                .id
                .clone();
            let input = FuelEntryInput {
                date: args.date.unwrap_or_else(today),
                km_total: args.km_total,
                km_partial: args.km_partial,
                fuel_type: args.fuel.into(),
                value: args.value,
                liters: args.liters,
            };
            let entry_id = app.add_fuel_entry(&vehicle_id, input)?;
            if let Some(entry) = app
                .ledger()?
                .vehicle(&vehicle_id)
                .and_then(|v| v.fuel_entry(&entry_id))
            {
                println!(
                    "Recorded fill-up {}: {:.2}/l, {:.2} km/l.",
                    short_id(&entry.id),
                    entry.price_per_liter,
                    entry.efficiency
                );
            }
        }
        FuelCommand::Edit(args) => {
            let (vehicle_id, entry_id, mut input) = {
                let vehicle = pick_vehicle(app.ledger()?, args.vehicle.as_deref())?;
                let entry_id = vehicle.resolve_fuel_entry(&args.entry)?;
                let entry = vehicle
                    .fuel_entry(&entry_id)
                    .ok_or_else(|| Error::entry_not_found(entry_id.as_str()))?;
                (vehicle.id.clone(), entry_id, entry.input())
            };
            if let Some(date) = args.date {
                input.date = date;
            }
            if let Some(km_total) = args.km_total {
                input.km_total = km_total;
            }
            if let Some(km_partial) = args.km_partial {
                input.km_partial = km_partial;
            }
            if let Some(fuel) = args.fuel {
                input.fuel_type = fuel.into();
            }
            if let Some(value) = args.value {
                input.value = value;
            }
            if let Some(liters) = args.liters {
                input.liters = liters;
            }
            app.update_fuel_entry(&vehicle_id, &entry_id, input)?;
            println!("Updated fill-up {}.", short_id(&entry_id));
        }
        FuelCommand::Remove { entry, vehicle } => {
            let (vehicle_id, entry_id) = {
                let vehicle = pick_vehicle(app.ledger()?, vehicle.as_deref())?;
                (vehicle.id.clone(), vehicle.resolve_fuel_entry(&entry)?)
            };
            app.remove_fuel_entry(&vehicle_id, &entry_id)?;
            println!("Removed fill-up {}.", short_id(&entry_id));
        }
        FuelCommand::List { vehicle, format } => {
            let vehicle = pick_vehicle(app.ledger()?, vehicle.as_deref())?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&vehicle.entries)?);
                }
                OutputFormat::Plain => {
                    for e in &vehicle.entries {
                        println!(
                            "{}\t{}\t{}\t{:.2}\t{:.2}",
                            e.id, e.date, e.fuel_type, e.value, e.liters
                        );
                    }
                }
                OutputFormat::Table => {
                    println!(
                        "{:<8}  {:<10}  {:<8} {:>9} {:>8} {:>8} {:>9} {:>7} {:>7}",
                        "ID", "DATE", "FUEL", "ODOMETER", "KM", "LITERS", "VALUE", "PRICE", "KM/L"
                    );
                    for e in &vehicle.entries {
                        println!(
                            "{:<8}  {:<10}  {:<8} {:>9.0} {:>8.1} {:>8.2} {:>9.2} {:>7.2} {:>7.2}",
                            short_id(&e.id),
                            e.date,
                            e.fuel_type,
                            e.km_total,
                            e.km_partial,
                            e.liters,
                            e.value,
                            e.price_per_liter,
                            e.efficiency
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn handle_maintenance(app: &mut App, cmd: MaintenanceCommand) -> Result<()> {
    match cmd {
        MaintenanceCommand::Add(args) => {
            let vehicle_id = pick_vehicle(app.ledger()?, args.vehicle.as_deref())?
                .id
                .clone();
            let input = MaintenanceInput {
                date: args.date.unwrap_or_else(today),
                description: args.description,
                category: args.category.into(),
                odometer: args.km,
                value: args.value,
                kind: args.kind.into(),
            };
            let entry_id = app.add_maintenance_entry(&vehicle_id, input)?;
            println!("Recorded maintenance {}.", short_id(&entry_id));
        }
        MaintenanceCommand::Edit(args) => {
            let (vehicle_id, entry_id, mut input) = {
                let vehicle = pick_vehicle(app.ledger()?, args.vehicle.as_deref())?;
                let entry_id = vehicle.resolve_maintenance_entry(&args.entry)?;
                let entry = vehicle
                    .maintenance_entry(&entry_id)
                    .ok_or_else(|| Error::entry_not_found(entry_id.as_str()))?;
                (vehicle.id.clone(), entry_id, entry.input())
            };
            if let Some(description) = args.description {
                input.description = description;
            }
            if let Some(date) = args.date {
                input.date = date;
            }
            if let Some(category) = args.category {
                input.category = category.into();
            }
            if let Some(km) = args.km {
                input.odometer = km;
            }
            if let Some(value) = args.value {
                input.value = value;
            }
            if let Some(kind) = args.kind {
                input.kind = kind.into();
            }
            app.update_maintenance_entry(&vehicle_id, &entry_id, input)?;
            println!("Updated maintenance {}.", short_id(&entry_id));
        }
        MaintenanceCommand::Remove { entry, vehicle } => {
            let (vehicle_id, entry_id) = {
                let vehicle = pick_vehicle(app.ledger()?, vehicle.as_deref())?;
                (vehicle.id.clone(), vehicle.resolve_maintenance_entry(&entry)?)
            };
            app.remove_maintenance_entry(&vehicle_id, &entry_id)?;
            println!("Removed maintenance {}.", short_id(&entry_id));
        }
        MaintenanceCommand::List { vehicle, format } => {
            let vehicle = pick_vehicle(app.ledger()?, vehicle.as_deref())?;
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&vehicle.maintenance_entries)?
                    );
                }
                OutputFormat::Plain => {
                    for e in &vehicle.maintenance_entries {
                        println!(
                            "{}\t{}\t{}\t{}\t{:.2}",
                            e.id, e.date, e.category, e.description, e.value
                        );
                    }
                }
                OutputFormat::Table => {
                    println!(
                        "{:<8}  {:<10}  {:<12} {:<10} {:>9} {:>9}  DESCRIPTION",
                        "ID", "DATE", "CATEGORY", "TYPE", "ODOMETER", "VALUE"
                    );
                    for e in &vehicle.maintenance_entries {
                        println!(
                            "{:<8}  {:<10}  {:<12} {:<10} {:>9.0} {:>9.2}  {}",
                            short_id(&e.id),
                            e.date,
                            e.category,
                            e.kind,
                            e.odometer,
                            e.value,
                            e.description
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn handle_stats(app: &App, cmd: &StatsCommand) -> Result<()> {
    let ledger = app.ledger()?;

    if cmd.fleet {
        let fleet = fleet_aggregate(&ledger.vehicles);
        if cmd.json {
            println!("{}", serde_json::to_string_pretty(&fleet)?);
        } else {
            println!("Fleet");
            println!("-----");
            println!("Vehicles:        {}", fleet.vehicle_count);
            println!("Total spent:     {:.2}", fleet.total_spent);
            println!("Total liters:    {:.2}", fleet.total_liters);
        }
        return Ok(());
    }

    let vehicle = pick_vehicle(ledger, cmd.vehicle.as_deref())?;
    let agg = vehicle_aggregate(vehicle);
    if cmd.json {
        let out = serde_json::json!({
            "vehicleId": vehicle.id,
            "vehicleName": vehicle.name,
            "stats": agg,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", vehicle.name);
    println!("{}", "-".repeat(vehicle.name.chars().count()));
    println!("Fill-ups:            {}", agg.fuel_entry_count);
    println!("Fuel spent:          {:.2}", agg.total_spent_fuel);
    println!("Liters:              {:.2}", agg.total_liters);
    println!("Distance:            {:.1} km", agg.total_distance);
    println!("Average efficiency:  {:.2} km/l", agg.average_efficiency);
    println!("Last odometer:       {:.0} km", agg.last_odometer);
    println!();
    println!("Maintenance records: {}", agg.maintenance_entry_count);
    println!("Maintenance spent:   {:.2}", agg.total_spent_maintenance);
    for line in &agg.maintenance_by_category {
        println!("  {:<18} {:>10.2}", line.category.label(), line.total);
    }
    println!();
    println!("Total spent:         {:.2}", agg.total_spent());
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn handle_chart(app: &App, cmd: &ChartCommand) -> Result<()> {
    let vehicle = pick_vehicle(app.ledger()?, cmd.vehicle.as_deref())?;
    let points = time_series(vehicle);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }
    if points.is_empty() {
        println!("No fill-ups recorded for {}.", vehicle.name);
        return Ok(());
    }

    let max = points
        .iter()
        .map(|p| p.efficiency)
        .fold(f64::MIN, f64::max);
    println!(
        "{:<10}  {:>7} {:>7} {:>7}  EFFICIENCY",
        "DATE", "KM/L", "PRICE", "COST/KM"
    );
    for p in &points {
        let width = if max > 0.0 {
            (p.efficiency / max * CHART_WIDTH).round() as usize
        } else {
            0
        };
        println!(
            "{:<10}  {:>7.2} {:>7.2} {:>7.2}  {}",
            p.date,
            p.efficiency,
            p.price_per_liter,
            p.cost_per_km,
            "#".repeat(width)
        );
    }
    Ok(())
}

async fn handle_insight(config: &Config, app: &mut App) -> Result<()> {
    app.require_session()?;
    let requester = InsightRequester::new(GeminiProvider::new(config.insight.clone())?);
    match app.refresh_insight(&requester).await? {
        Some(text) => println!("{text}"),
        None => println!("No vehicle selected."),
    }
    Ok(())
}

fn handle_status(config: &Config, app: &App, json: bool) -> Result<()> {
    let stats = app.store().stats()?;
    let session = app.session();
    let username = session.map(|s| s.profile().username.clone());
    let active = session
        .and_then(|s| s.ledger().active_vehicle())
        .map(|v| v.name.clone());
    let insight_ready = config.insight.enabled && config.insight.api_key.is_some();

    if json {
        let status = serde_json::json!({
            "logged_in_as": username,
            "active_vehicle": active,
            "database_path": config.database_path(),
            "documents": stats.total_keys,
            "ledgers": stats.ledger_count,
            "last_write": stats.last_write,
            "database_size_bytes": stats.db_size_bytes,
            "insight_configured": insight_ready,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("drivectl status");
        println!("---------------");
        println!(
            "Logged in as:   {}",
            username.as_deref().unwrap_or("(nobody)")
        );
        println!("Active vehicle: {}", active.as_deref().unwrap_or("(none)"));
        println!("Database:       {}", config.database_path().display());
        println!("Documents:      {}", stats.total_keys);
        println!("Ledgers:        {}", stats.ledger_count);
        println!(
            "Last write:     {}",
            stats.last_write.as_deref().unwrap_or("(never)")
        );
        println!("Size:           {} bytes", stats.db_size_bytes);
        println!(
            "Insight:        {}",
            if insight_ready {
                "configured"
            } else {
                "not configured"
            }
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                if shown.insight.api_key.is_some() {
                    shown.insight.api_key = Some("********".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Accounts]");
                println!("  Require password:   {}", config.accounts.require_password);
                println!("  Hash cost:          {}", config.accounts.hash_cost);
                println!();
                println!("[Insight]");
                println!("  Enabled:            {}", config.insight.enabled);
                println!(
                    "  API key:            {}",
                    if config.insight.api_key.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!("  Model:              {}", config.insight.model);
                println!("  Base URL:           {}", config.insight.base_url);
                println!("  Temperature:        {}", config.insight.temperature);
                println!("  Max output tokens:  {}", config.insight.max_output_tokens);
                println!("  Timeout (secs):     {}", config.insight.timeout_secs);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => validate_config(file),
    }
    Ok(())
}

fn validate_config(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}
