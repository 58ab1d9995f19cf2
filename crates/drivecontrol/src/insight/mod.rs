//! Short advisory texts about a vehicle's fuel history.
//!
//! The text itself comes from an external generation service behind the
//! [`InsightProvider`] trait. [`InsightRequester`] is what the rest of the
//! crate talks to: it never fails, mapping an empty history, a service error
//! and an empty answer to fixed messages.

mod gemini;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ledger::{FuelType, Vehicle};

pub use gemini::GeminiProvider;

/// Returned for a vehicle with no fuel entries; the service is not called.
pub const NO_DATA_PLACEHOLDER: &str = "Add a few fill-ups to receive fuel insights.";

/// Returned when the service call fails.
pub const FAILURE_MESSAGE: &str = "Could not load fuel insights right now.";

/// Returned when the service answers with no text.
pub const EMPTY_RESPONSE_MESSAGE: &str = "No insights could be generated at the moment.";

/// One fill-up as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightDatum {
    /// Day of the fill-up.
    pub date: NaiveDate,
    /// Fuel bought.
    pub fuel_type: FuelType,
    /// Kilometers per liter, two decimals.
    pub efficiency: f64,
    /// Price per liter, two decimals.
    pub price_per_liter: f64,
    /// Money per kilometer, two decimals.
    pub cost_per_km: f64,
}

/// Everything the service is told about a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    /// Display name of the vehicle.
    pub vehicle_name: String,
    /// Fill-ups, most recent first.
    pub entries: Vec<InsightDatum>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl InsightRequest {
    /// Summarize a vehicle's fuel history.
    #[must_use]
    pub fn from_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            vehicle_name: vehicle.name.clone(),
            entries: vehicle
                .entries
                .iter()
                .map(|e| InsightDatum {
                    date: e.date,
                    fuel_type: e.fuel_type,
                    efficiency: round2(e.efficiency),
                    price_per_liter: round2(e.price_per_liter),
                    cost_per_km: round2(e.cost_per_km()),
                })
                .collect(),
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produce advice for the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unavailable or the call fails.
    async fn generate(&self, request: &InsightRequest) -> Result<String>;
}

/// Front end to an [`InsightProvider`] that always yields displayable text.
#[derive(Debug)]
pub struct InsightRequester<P> {
    provider: P,
}

impl<P: InsightProvider> InsightRequester<P> {
    /// Wrap a provider.
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get advice for a vehicle.
    ///
    /// Never fails: problems are logged and replaced by a fixed message.
    pub async fn get_insight(&self, vehicle: &Vehicle) -> String {
        if vehicle.entries.is_empty() {
            debug!(vehicle = %vehicle.id, "No fuel entries, skipping insight request");
            return NO_DATA_PLACEHOLDER.to_string();
        }

        let request = InsightRequest::from_vehicle(vehicle);
        match self.provider.generate(&request).await {
            Ok(text) if text.trim().is_empty() => {
                warn!(provider = self.provider.name(), "Empty insight response");
                EMPTY_RESPONSE_MESSAGE.to_string()
            }
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Insight request failed");
                FAILURE_MESSAGE.to_string()
            }
        }
    }
}
