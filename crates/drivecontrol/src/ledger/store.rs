//! Loading and saving per-account ledger snapshots.

use tracing::{debug, warn};

use super::AppState;
use crate::error::Result;
use crate::storage::{ledger_key, KeyValueStore};

/// Reads and writes [`AppState`] snapshots in a [`KeyValueStore`].
///
/// Each account has one snapshot under [`ledger_key`]. Saves overwrite the
/// whole document.
#[derive(Debug)]
pub struct LedgerStore<'a, S: KeyValueStore> {
    store: &'a S,
}

impl<'a, S: KeyValueStore> LedgerStore<'a, S> {
    /// Wrap a key-value store.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Load an account's ledger.
    ///
    /// A missing snapshot yields an empty ledger. So does a snapshot that
    /// cannot be read or parsed; the problem is logged and otherwise ignored.
    /// A dangling active pointer in the stored data is repaired.
    #[must_use]
    pub fn load(&self, account_id: &str) -> AppState {
        let key = ledger_key(account_id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(account = %account_id, "No ledger stored, starting empty");
                return AppState::new();
            }
            Err(e) => {
                warn!(account = %account_id, error = %e, "Failed to read ledger, starting empty");
                return AppState::new();
            }
        };

        match serde_json::from_str::<AppState>(&raw) {
            Ok(mut state) => {
                if state.repair_active_pointer() {
                    warn!(account = %account_id, "Stored active vehicle was missing, reset");
                }
                debug!(
                    account = %account_id,
                    vehicles = state.vehicles.len(),
                    "Loaded ledger"
                );
                state
            }
            Err(e) => {
                warn!(account = %account_id, error = %e, "Malformed ledger snapshot, starting empty");
                AppState::new()
            }
        }
    }

    /// Overwrite an account's stored ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, account_id: &str, state: &AppState) -> Result<()> {
        self.store.set_json(&ledger_key(account_id), state)?;
        debug!(
            account = %account_id,
            vehicles = state.vehicles.len(),
            "Saved ledger"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{FuelEntryInput, FuelType, MaintenanceCategory, MaintenanceInput};
    use crate::ledger::{ServiceKind, VehicleAttrs};
    use crate::storage::{MemoryStore, Storage};
    use chrono::NaiveDate;

    fn sample_state() -> AppState {
        let mut state = AppState::new();
        let gol = state.add_vehicle(VehicleAttrs::named("Gol")).unwrap();
        state
            .add_fuel_entry(
                &gol,
                FuelEntryInput {
                    date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                    km_total: 52_310.0,
                    km_partial: 403.5,
                    fuel_type: FuelType::Gasoline,
                    value: 231.9,
                    liters: 38.4,
                },
            )
            .unwrap();
        state
            .add_maintenance_entry(
                &gol,
                MaintenanceInput {
                    date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
                    description: "Oil and filter".to_string(),
                    category: MaintenanceCategory::OilChange,
                    odometer: 52_400.0,
                    value: 310.0,
                    kind: ServiceKind::Preventive,
                },
            )
            .unwrap();
        state.add_vehicle(VehicleAttrs::named("Uno")).unwrap();
        state
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = MemoryStore::new();
        let ledgers = LedgerStore::new(&store);
        assert_eq!(ledgers.load("nobody"), AppState::new());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let store = Storage::open_in_memory().unwrap();
        let ledgers = LedgerStore::new(&store);
        let state = sample_state();

        ledgers.save("acct-1", &state).unwrap();
        assert_eq!(ledgers.load("acct-1"), state);
    }

    #[test]
    fn test_derived_values_reload_bit_identical() {
        let store = MemoryStore::new();
        let ledgers = LedgerStore::new(&store);

        for i in 0..1000_u32 {
            let step = f64::from(i);
            let mut state = AppState::new();
            let id = state.add_vehicle(VehicleAttrs::named("Gol")).unwrap();
            state
                .add_fuel_entry(
                    &id,
                    FuelEntryInput {
                        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                        km_total: 10_000.0 + step,
                        km_partial: 100.0 + 3.3 * step,
                        fuel_type: FuelType::Ethanol,
                        value: 30.0 + 1.91 * step,
                        liters: 7.0 + 0.137 * step,
                    },
                )
                .unwrap();

            ledgers.save("a", &state).unwrap();
            let loaded = ledgers.load("a");
            let (saved, reloaded) = (&state.vehicles[0].entries[0], &loaded.vehicles[0].entries[0]);
            assert_eq!(
                reloaded.efficiency.to_bits(),
                saved.efficiency.to_bits(),
                "efficiency drifted at step {i}"
            );
            assert_eq!(
                reloaded.price_per_liter.to_bits(),
                saved.price_per_liter.to_bits(),
                "price per liter drifted at step {i}"
            );
            assert_eq!(loaded, state);
        }
    }

    #[test]
    fn test_ledgers_are_isolated_per_account() {
        let store = MemoryStore::new();
        let ledgers = LedgerStore::new(&store);

        ledgers.save("a", &sample_state()).unwrap();
        assert!(ledgers.load("b").vehicles.is_empty());
    }

    #[test]
    fn test_malformed_snapshot_is_empty() {
        let store = MemoryStore::new();
        store.set(&ledger_key("a"), "{not json").unwrap();
        assert_eq!(LedgerStore::new(&store).load("a"), AppState::new());

        store
            .set(&ledger_key("a"), r#"{"vehicles": 42}"#)
            .unwrap();
        assert_eq!(LedgerStore::new(&store).load("a"), AppState::new());
    }

    #[test]
    fn test_dangling_active_pointer_repaired_on_load() {
        let store = MemoryStore::new();
        let mut state = sample_state();
        state.active_vehicle_id = Some("gone".to_string());
        store.set_json(&ledger_key("a"), &state).unwrap();

        let loaded = LedgerStore::new(&store).load("a");
        assert_eq!(
            loaded.active_vehicle_id.as_deref(),
            Some(loaded.vehicles[0].id.as_str())
        );
    }
}
