//! `drivecontrol` - A personal vehicle fuel and maintenance expense tracker
//!
//! This library keeps per-account ledgers of vehicles, fill-ups and
//! maintenance events in a local key-value store, computes spending and
//! efficiency statistics from them, and asks an external text-generation
//! service for short fuel tips.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod accounts;
pub mod cli;
pub mod config;
pub mod error;
pub mod insight;
pub mod ledger;
pub mod logging;
pub mod session;
pub mod stats;
pub mod storage;
pub mod tracker;

pub use accounts::{Account, AccountDirectory, Profile};
pub use config::Config;
pub use error::{Error, Result};
pub use insight::{GeminiProvider, InsightProvider, InsightRequester};
pub use ledger::{AppState, FuelEntry, FuelEntryInput, MaintenanceEntry, MaintenanceInput, Vehicle};
pub use logging::init_logging;
pub use session::Session;
pub use stats::{fleet_aggregate, time_series, vehicle_aggregate};
pub use storage::{KeyValueStore, MemoryStore, Storage, StorageStats};
pub use tracker::Tracker;
