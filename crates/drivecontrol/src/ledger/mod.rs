//! The per-account ledger: vehicles, their fuel and maintenance history, and
//! the active-vehicle pointer.
//!
//! [`AppState`] holds the data and every mutation on it. Mutations validate
//! their input first and only then touch the state, so a rejected call leaves
//! the ledger unchanged. Persisting is the caller's job (see [`store`]).
//!
//! The active pointer always names a vehicle present in the list, or is
//! `None`. A newly added vehicle always becomes active.

pub mod fuel;
pub mod maintenance;
pub mod store;
pub mod vehicle;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};

pub use fuel::{compute_fuel_entry, FuelEntry, FuelEntryInput, FuelType};
pub use maintenance::{MaintenanceCategory, MaintenanceEntry, MaintenanceInput, ServiceKind};
pub use store::LedgerStore;
pub use vehicle::{Vehicle, VehicleAttrs, DEFAULT_COLOR, PRESET_COLORS};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(field, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(Error::validation(field, "must be greater than zero"));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::validation(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(Error::validation(field, "must not be negative"));
    }
    Ok(())
}

/// One account's ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Vehicles in creation order.
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    /// Id of the vehicle selected for display.
    #[serde(default)]
    pub active_vehicle_id: Option<String>,
}

impl AppState {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a vehicle by id.
    #[must_use]
    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    fn vehicle_mut(&mut self, id: &str) -> Result<&mut Vehicle> {
        self.vehicles
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| Error::vehicle_not_found(id))
    }

    /// The active vehicle, if any.
    #[must_use]
    pub fn active_vehicle(&self) -> Option<&Vehicle> {
        self.active_vehicle_id
            .as_deref()
            .and_then(|id| self.vehicle(id))
    }

    /// Resolve a user-typed reference to a vehicle id.
    ///
    /// Accepts an exact id, a unique id prefix, or a name (ignoring case).
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] if nothing matches or the reference
    /// is ambiguous.
    pub fn resolve_vehicle(&self, reference: &str) -> Result<String> {
        if let Some(v) = self.vehicle(reference) {
            return Ok(v.id.clone());
        }

        let by_name: Vec<&Vehicle> = self
            .vehicles
            .iter()
            .filter(|v| v.name.to_lowercase() == reference.to_lowercase())
            .collect();
        if let [only] = by_name.as_slice() {
            return Ok(only.id.clone());
        }

        let by_prefix: Vec<&Vehicle> = self
            .vehicles
            .iter()
            .filter(|v| !reference.is_empty() && v.id.starts_with(reference))
            .collect();
        match by_prefix.as_slice() {
            [only] => Ok(only.id.clone()),
            _ => Err(Error::vehicle_not_found(reference)),
        }
    }

    /// Add a vehicle and make it the active one.
    ///
    /// Returns the id of the new vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the attributes are rejected.
    pub fn add_vehicle(&mut self, attrs: VehicleAttrs) -> Result<String> {
        let attrs = attrs.validated()?;
        let id = new_id();
        info!(vehicle = %id, name = %attrs.name, "Adding vehicle");
        self.vehicles.push(Vehicle::from_attrs(id.clone(), attrs));
        self.active_vehicle_id = Some(id.clone());
        Ok(id)
    }

    /// Remove a vehicle together with all its entries.
    ///
    /// If it was active, the first remaining vehicle becomes active, or none
    /// if the list is now empty. Otherwise the pointer is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] if no vehicle has this id.
    pub fn remove_vehicle(&mut self, id: &str) -> Result<Vehicle> {
        let index = self
            .vehicles
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| Error::vehicle_not_found(id))?;
        let removed = self.vehicles.remove(index);

        if self.active_vehicle_id.as_deref() == Some(id) {
            self.active_vehicle_id = self.vehicles.first().map(|v| v.id.clone());
        }
        info!(
            vehicle = %id,
            fuel_entries = removed.entries.len(),
            maintenance_entries = removed.maintenance_entries.len(),
            "Removed vehicle"
        );
        Ok(removed)
    }

    /// Replace the editable fields of a vehicle.
    ///
    /// Returns `false` without changing anything if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the attributes are rejected.
    pub fn update_vehicle(&mut self, id: &str, attrs: VehicleAttrs) -> Result<bool> {
        let attrs = attrs.validated()?;
        match self.vehicles.iter_mut().find(|v| v.id == id) {
            Some(vehicle) => {
                vehicle.apply_attrs(attrs);
                debug!(vehicle = %id, "Updated vehicle");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Select the active vehicle, or clear the selection with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] if the id is not in the ledger.
    pub fn set_active_vehicle(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            if self.vehicle(id).is_none() {
                return Err(Error::vehicle_not_found(id));
            }
        }
        self.active_vehicle_id = id.map(str::to_string);
        Ok(())
    }

    /// Record a fill-up at the head of the vehicle's history.
    ///
    /// Returns the id of the new entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for rejected input and
    /// [`Error::VehicleNotFound`] for an unknown vehicle.
    pub fn add_fuel_entry(&mut self, vehicle_id: &str, input: FuelEntryInput) -> Result<String> {
        let entry = compute_fuel_entry(input)?;
        let vehicle = self.vehicle_mut(vehicle_id)?;
        let id = entry.id.clone();
        debug!(
            vehicle = %vehicle_id,
            entry = %id,
            efficiency = entry.efficiency,
            "Adding fuel entry"
        );
        vehicle.entries.insert(0, entry);
        Ok(id)
    }

    /// Replace a fill-up's fields and recompute its derived values.
    ///
    /// The entry keeps its id and position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`], [`Error::VehicleNotFound`] or
    /// [`Error::EntryNotFound`].
    pub fn update_fuel_entry(
        &mut self,
        vehicle_id: &str,
        entry_id: &str,
        input: FuelEntryInput,
    ) -> Result<()> {
        let updated = FuelEntry::compute(entry_id, input)?;
        let vehicle = self.vehicle_mut(vehicle_id)?;
        let slot = vehicle
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| Error::entry_not_found(entry_id))?;
        *slot = updated;
        Ok(())
    }

    /// Delete a fill-up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] or [`Error::EntryNotFound`].
    pub fn remove_fuel_entry(&mut self, vehicle_id: &str, entry_id: &str) -> Result<FuelEntry> {
        let vehicle = self.vehicle_mut(vehicle_id)?;
        let index = vehicle
            .entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or_else(|| Error::entry_not_found(entry_id))?;
        Ok(vehicle.entries.remove(index))
    }

    /// Record a maintenance event at the head of the vehicle's history.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] or [`Error::VehicleNotFound`].
    pub fn add_maintenance_entry(
        &mut self,
        vehicle_id: &str,
        input: MaintenanceInput,
    ) -> Result<String> {
        let entry = MaintenanceEntry::new(new_id(), input)?;
        let vehicle = self.vehicle_mut(vehicle_id)?;
        let id = entry.id.clone();
        debug!(vehicle = %vehicle_id, entry = %id, "Adding maintenance entry");
        vehicle.maintenance_entries.insert(0, entry);
        Ok(id)
    }

    /// Replace a maintenance event's fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`], [`Error::VehicleNotFound`] or
    /// [`Error::EntryNotFound`].
    pub fn update_maintenance_entry(
        &mut self,
        vehicle_id: &str,
        entry_id: &str,
        input: MaintenanceInput,
    ) -> Result<()> {
        let updated = MaintenanceEntry::new(entry_id, input)?;
        let vehicle = self.vehicle_mut(vehicle_id)?;
        let slot = vehicle
            .maintenance_entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| Error::entry_not_found(entry_id))?;
        *slot = updated;
        Ok(())
    }

    /// Delete a maintenance event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] or [`Error::EntryNotFound`].
    pub fn remove_maintenance_entry(
        &mut self,
        vehicle_id: &str,
        entry_id: &str,
    ) -> Result<MaintenanceEntry> {
        let vehicle = self.vehicle_mut(vehicle_id)?;
        let index = vehicle
            .maintenance_entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or_else(|| Error::entry_not_found(entry_id))?;
        Ok(vehicle.maintenance_entries.remove(index))
    }

    /// Point a dangling active id at the first vehicle (or nothing).
    ///
    /// Returns `true` if the pointer had to be changed.
    pub fn repair_active_pointer(&mut self) -> bool {
        let dangling = match self.active_vehicle_id.as_deref() {
            Some(id) => self.vehicle(id).is_none(),
            None => false,
        };
        if dangling {
            self.active_vehicle_id = self.vehicles.first().map(|v| v.id.clone());
        }
        dangling
    }
}
