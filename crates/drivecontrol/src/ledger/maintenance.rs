//! Maintenance entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::require_non_negative;
use crate::error::{Error, Result};

/// Service category of a maintenance entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceCategory {
    /// Oil change.
    #[serde(alias = "Troca de Óleo")]
    OilChange,
    /// Tires.
    #[serde(alias = "Pneus")]
    Tires,
    /// Brakes.
    #[serde(alias = "Freios")]
    Brakes,
    /// Suspension.
    #[serde(alias = "Suspensão")]
    Suspension,
    /// Engine.
    #[serde(alias = "Motor")]
    Engine,
    /// Electrical system.
    #[serde(alias = "Elétrica")]
    Electrical,
    /// Filters.
    #[serde(alias = "Filtros")]
    Filters,
    /// Air conditioning.
    #[serde(alias = "Ar Condicionado")]
    AirConditioning,
    /// Cleaning and cosmetic work.
    #[serde(alias = "Estética/Limpeza")]
    Cosmetic,
    /// Anything else.
    #[default]
    #[serde(alias = "Outros")]
    Other,
}

impl MaintenanceCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 10] = [
        Self::OilChange,
        Self::Tires,
        Self::Brakes,
        Self::Suspension,
        Self::Engine,
        Self::Electrical,
        Self::Filters,
        Self::AirConditioning,
        Self::Cosmetic,
        Self::Other,
    ];

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OilChange => "Oil change",
            Self::Tires => "Tires",
            Self::Brakes => "Brakes",
            Self::Suspension => "Suspension",
            Self::Engine => "Engine",
            Self::Electrical => "Electrical",
            Self::Filters => "Filters",
            Self::AirConditioning => "A/C",
            Self::Cosmetic => "Cosmetic",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for MaintenanceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Whether a service was scheduled or a repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Scheduled service.
    #[default]
    #[serde(alias = "Preventiva")]
    Preventive,
    /// Repair after a failure.
    #[serde(alias = "Corretiva")]
    Corrective,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preventive => f.pad("preventive"),
            Self::Corrective => f.pad("corrective"),
        }
    }
}

/// What the user types in for a maintenance record.
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceInput {
    /// Day of the service.
    pub date: NaiveDate,
    /// What was done.
    pub description: String,
    /// Service category.
    pub category: MaintenanceCategory,
    /// Odometer reading at the time of service.
    pub odometer: f64,
    /// Amount paid.
    pub value: f64,
    /// Preventive or corrective.
    pub kind: ServiceKind,
}

impl MaintenanceInput {
    /// Check the input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank description or a negative or
    /// non-finite odometer or value.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("description", "must not be empty"));
        }
        require_non_negative("odometer", self.odometer)?;
        require_non_negative("value", self.value)?;
        Ok(())
    }
}

/// A recorded maintenance event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEntry {
    /// Identifier, unique within the vehicle.
    pub id: String,
    /// Day of the service.
    pub date: NaiveDate,
    /// What was done.
    pub description: String,
    /// Service category.
    #[serde(default)]
    pub category: MaintenanceCategory,
    /// Odometer reading at the time of service.
    #[serde(rename = "km")]
    pub odometer: f64,
    /// Amount paid.
    pub value: f64,
    /// Preventive or corrective.
    #[serde(rename = "type", default)]
    pub kind: ServiceKind,
}

impl MaintenanceEntry {
    /// Validate `input` and build the entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the input is rejected.
    pub fn new(id: impl Into<String>, input: MaintenanceInput) -> Result<Self> {
        input.validate()?;
        Ok(Self {
            id: id.into(),
            date: input.date,
            description: input.description.trim().to_string(),
            category: input.category,
            odometer: input.odometer,
            value: input.value,
            kind: input.kind,
        })
    }

    /// The user-entered fields of this entry.
    #[must_use]
    pub fn input(&self) -> MaintenanceInput {
        MaintenanceInput {
            date: self.date,
            description: self.description.clone(),
            category: self.category,
            odometer: self.odometer,
            value: self.value,
            kind: self.kind,
        }
    }
}
