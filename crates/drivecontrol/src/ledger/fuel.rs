//! Fuel entries and their derived fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{require_non_negative, require_positive};
use crate::error::Result;

/// Kind of fuel bought at a fill-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    /// Gasoline.
    #[default]
    #[serde(alias = "Gasolina")]
    Gasoline,
    /// Ethanol.
    #[serde(alias = "Álcool", alias = "Alcool")]
    Ethanol,
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gasoline => f.pad("gasoline"),
            Self::Ethanol => f.pad("ethanol"),
        }
    }
}

/// What the user types in for a fill-up, before derived fields exist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuelEntryInput {
    /// Day of the fill-up.
    pub date: NaiveDate,
    /// Odometer reading at the pump.
    pub km_total: f64,
    /// Distance driven since the previous fill-up.
    pub km_partial: f64,
    /// Fuel bought.
    pub fuel_type: FuelType,
    /// Amount paid.
    pub value: f64,
    /// Liters bought.
    pub liters: f64,
}

impl FuelEntryInput {
    /// Reject inputs whose derived fields would not be finite.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] if `liters` or `km_partial` is not
    /// positive, or if `km_total` or `value` is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        require_positive("liters", self.liters)?;
        require_positive("km_partial", self.km_partial)?;
        require_non_negative("km_total", self.km_total)?;
        require_non_negative("value", self.value)?;
        Ok(())
    }
}

/// A recorded fill-up.
///
/// `price_per_liter` and `efficiency` are computed from the other fields
/// whenever the entry is created or edited; there is no way to set them
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelEntry {
    /// Identifier, unique within the vehicle.
    pub id: String,
    /// Day of the fill-up.
    pub date: NaiveDate,
    /// Odometer reading at the pump.
    pub km_total: f64,
    /// Distance driven since the previous fill-up.
    pub km_partial: f64,
    /// Fuel bought.
    pub fuel_type: FuelType,
    /// Amount paid.
    pub value: f64,
    /// Liters bought.
    pub liters: f64,
    /// `value / liters`.
    pub price_per_liter: f64,
    /// `km_partial / liters`.
    pub efficiency: f64,
}

impl FuelEntry {
    /// Validate `input` and build the entry with its derived fields.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Validation`] if the input is rejected by
    /// [`FuelEntryInput::validate`].
    pub fn compute(id: impl Into<String>, input: FuelEntryInput) -> Result<Self> {
        input.validate()?;
        Ok(Self {
            id: id.into(),
            date: input.date,
            km_total: input.km_total,
            km_partial: input.km_partial,
            fuel_type: input.fuel_type,
            value: input.value,
            liters: input.liters,
            price_per_liter: input.value / input.liters,
            efficiency: input.km_partial / input.liters,
        })
    }

    /// The user-entered fields of this entry.
    #[must_use]
    pub fn input(&self) -> FuelEntryInput {
        FuelEntryInput {
            date: self.date,
            km_total: self.km_total,
            km_partial: self.km_partial,
            fuel_type: self.fuel_type,
            value: self.value,
            liters: self.liters,
        }
    }

    /// Money spent per kilometer driven on this tank.
    #[must_use]
    pub fn cost_per_km(&self) -> f64 {
        self.value / self.km_partial
    }
}

/// Build a new fuel entry with a freshly generated id.
///
/// # Errors
///
/// Returns [`crate::Error::Validation`] if the input is rejected.
pub fn compute_fuel_entry(input: FuelEntryInput) -> Result<FuelEntry> {
    FuelEntry::compute(uuid::Uuid::new_v4().to_string(), input)
}
