//! Aggregate statistics over a vehicle or a whole ledger.
//!
//! Everything here is a pure function of the stored entries. Nothing is
//! cached; callers recompute after each mutation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::{MaintenanceCategory, Vehicle};

/// Money spent on one maintenance category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// The category.
    pub category: MaintenanceCategory,
    /// Sum of entry values in it.
    pub total: f64,
}

/// Summary of a single vehicle's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleAggregate {
    /// Sum of fuel entry values.
    pub total_spent_fuel: f64,
    /// Sum of liters bought.
    pub total_liters: f64,
    /// Unweighted mean of per-entry efficiency; 0 without entries.
    pub average_efficiency: f64,
    /// Odometer of the most recently added fuel entry; 0 without entries.
    pub last_odometer: f64,
    /// Sum of maintenance entry values.
    pub total_spent_maintenance: f64,
    /// Maintenance spending per category, largest first.
    pub maintenance_by_category: Vec<CategoryTotal>,
    /// Number of fuel entries.
    pub fuel_entry_count: usize,
    /// Number of maintenance entries.
    pub maintenance_entry_count: usize,
    /// Sum of partial distances over all fuel entries.
    pub total_distance: f64,
}

impl VehicleAggregate {
    /// Fuel plus maintenance spending.
    #[must_use]
    pub fn total_spent(&self) -> f64 {
        self.total_spent_fuel + self.total_spent_maintenance
    }
}

/// Summary across every vehicle of an account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetAggregate {
    /// Fuel and maintenance spending across the fleet.
    pub total_spent: f64,
    /// Liters bought across the fleet.
    pub total_liters: f64,
    /// Number of vehicles.
    pub vehicle_count: usize,
}

/// One point of a vehicle's fuel chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePoint {
    /// Day of the fill-up.
    pub date: NaiveDate,
    /// Kilometers per liter on that tank.
    pub efficiency: f64,
    /// Price paid per liter.
    pub price_per_liter: f64,
    /// Money spent per kilometer on that tank.
    pub cost_per_km: f64,
}

/// Compute the summary of one vehicle.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vehicle_aggregate(vehicle: &Vehicle) -> VehicleAggregate {
    let fuel = &vehicle.entries;

    let total_spent_fuel = fuel.iter().map(|e| e.value).sum();
    let total_liters = fuel.iter().map(|e| e.liters).sum();
    let total_distance = fuel.iter().map(|e| e.km_partial).sum();
    let average_efficiency = if fuel.is_empty() {
        0.0
    } else {
        fuel.iter().map(|e| e.efficiency).sum::<f64>() / fuel.len() as f64
    };
    let last_odometer = fuel.first().map_or(0.0, |e| e.km_total);

    let mut by_category: BTreeMap<MaintenanceCategory, f64> = BTreeMap::new();
    for entry in &vehicle.maintenance_entries {
        *by_category.entry(entry.category).or_insert(0.0) += entry.value;
    }
    let mut maintenance_by_category: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    // Stable: equal totals stay in category order.
    maintenance_by_category.sort_by(|a, b| b.total.total_cmp(&a.total));

    VehicleAggregate {
        total_spent_fuel,
        total_liters,
        average_efficiency,
        last_odometer,
        total_spent_maintenance: vehicle.maintenance_entries.iter().map(|e| e.value).sum(),
        maintenance_by_category,
        fuel_entry_count: fuel.len(),
        maintenance_entry_count: vehicle.maintenance_entries.len(),
        total_distance,
    }
}

/// Compute the summary of a whole fleet.
#[must_use]
pub fn fleet_aggregate(vehicles: &[Vehicle]) -> FleetAggregate {
    let mut total_spent = 0.0;
    let mut total_liters = 0.0;
    for vehicle in vehicles {
        total_spent += vehicle.entries.iter().map(|e| e.value).sum::<f64>();
        total_spent += vehicle
            .maintenance_entries
            .iter()
            .map(|e| e.value)
            .sum::<f64>();
        total_liters += vehicle.entries.iter().map(|e| e.liters).sum::<f64>();
    }
    FleetAggregate {
        total_spent,
        total_liters,
        vehicle_count: vehicles.len(),
    }
}

/// A vehicle's fuel entries as chart points, oldest first.
///
/// Entries are ordered by date; entries sharing a date keep the order in
/// which they were added.
#[must_use]
pub fn time_series(vehicle: &Vehicle) -> Vec<TimePoint> {
    let mut points: Vec<TimePoint> = vehicle
        .entries
        .iter()
        .rev()
        .map(|e| TimePoint {
            date: e.date,
            efficiency: e.efficiency,
            price_per_liter: e.price_per_liter,
            cost_per_km: e.cost_per_km(),
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{
        AppState, FuelEntryInput, FuelType, MaintenanceInput, ServiceKind, VehicleAttrs,
    };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn fuel(date: NaiveDate, km_total: f64, value: f64, liters: f64, km_partial: f64) -> FuelEntryInput {
        FuelEntryInput {
            date,
            km_total,
            km_partial,
            fuel_type: FuelType::Gasoline,
            value,
            liters,
        }
    }

    fn service(category: MaintenanceCategory, value: f64) -> MaintenanceInput {
        MaintenanceInput {
            date: day(1),
            description: "service".to_string(),
            category,
            odometer: 1_000.0,
            value,
            kind: ServiceKind::Preventive,
        }
    }

    fn vehicle_with(fuel_inputs: &[FuelEntryInput], services: &[MaintenanceInput]) -> Vehicle {
        let mut state = AppState::new();
        let id = state.add_vehicle(VehicleAttrs::named("Gol")).unwrap();
        for input in fuel_inputs {
            state.add_fuel_entry(&id, *input).unwrap();
        }
        for input in services {
            state.add_maintenance_entry(&id, input.clone()).unwrap();
        }
        state.vehicle(&id).unwrap().clone()
    }

    #[test]
    fn test_single_fill_up() {
        let vehicle = vehicle_with(&[fuel(day(1), 1_000.0, 100.0, 10.0, 120.0)], &[]);
        let agg = vehicle_aggregate(&vehicle);

        assert!((vehicle.entries[0].price_per_liter - 10.0).abs() < 1e-9);
        assert!((vehicle.entries[0].efficiency - 12.0).abs() < 1e-9);
        assert!((agg.average_efficiency - 12.0).abs() < 1e-9);
        assert!((agg.total_spent_fuel - 100.0).abs() < 1e-9);
        assert!((agg.total_liters - 10.0).abs() < 1e-9);
        assert_eq!(agg.fuel_entry_count, 1);
    }

    #[test]
    fn test_average_efficiency_is_unweighted() {
        // 10 km/l on 10 liters and 20 km/l on 40 liters.
        let vehicle = vehicle_with(
            &[
                fuel(day(1), 1_000.0, 50.0, 10.0, 100.0),
                fuel(day(2), 1_800.0, 200.0, 40.0, 800.0),
            ],
            &[],
        );
        let agg = vehicle_aggregate(&vehicle);
        assert!((agg.average_efficiency - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_vehicle() {
        let vehicle = vehicle_with(&[], &[]);
        let agg = vehicle_aggregate(&vehicle);

        assert!(agg.average_efficiency.abs() < f64::EPSILON);
        assert!(agg.last_odometer.abs() < f64::EPSILON);
        assert!(agg.total_spent().abs() < f64::EPSILON);
        assert!(agg.maintenance_by_category.is_empty());
    }

    #[test]
    fn test_last_odometer_uses_most_recent_insertion() {
        // Added last but dated earlier: insertion order wins.
        let vehicle = vehicle_with(
            &[
                fuel(day(20), 5_000.0, 100.0, 10.0, 100.0),
                fuel(day(3), 4_200.0, 100.0, 10.0, 100.0),
            ],
            &[],
        );
        let agg = vehicle_aggregate(&vehicle);
        assert!((agg.last_odometer - 4_200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_spent_fuel_matches_entries() {
        let vehicle = vehicle_with(
            &[
                fuel(day(1), 100.0, 12.5, 2.0, 30.0),
                fuel(day(2), 200.0, 87.25, 14.0, 150.0),
                fuel(day(3), 300.0, 0.0, 1.0, 10.0),
            ],
            &[],
        );
        let expected: f64 = vehicle.entries.iter().map(|e| e.value).sum();
        let agg = vehicle_aggregate(&vehicle);

        assert!((agg.total_spent_fuel - expected).abs() < 1e-9);
        assert!((agg.total_distance - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_maintenance_by_category_sorted_descending() {
        let vehicle = vehicle_with(
            &[],
            &[
                service(MaintenanceCategory::Brakes, 200.0),
                service(MaintenanceCategory::Tires, 900.0),
                service(MaintenanceCategory::Brakes, 150.0),
                service(MaintenanceCategory::OilChange, 350.0),
            ],
        );
        let agg = vehicle_aggregate(&vehicle);

        let order: Vec<_> = agg
            .maintenance_by_category
            .iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(
            order,
            vec![
                MaintenanceCategory::Tires,
                MaintenanceCategory::OilChange,
                MaintenanceCategory::Brakes
            ]
        );
        assert!((agg.total_spent_maintenance - 1_600.0).abs() < 1e-9);
    }

    #[test]
    fn test_maintenance_category_ties_keep_category_order() {
        let vehicle = vehicle_with(
            &[],
            &[
                service(MaintenanceCategory::Other, 100.0),
                service(MaintenanceCategory::Engine, 100.0),
            ],
        );
        let agg = vehicle_aggregate(&vehicle);
        assert_eq!(
            agg.maintenance_by_category[0].category,
            MaintenanceCategory::Engine
        );
    }

    #[test]
    fn test_fleet_aggregate() {
        let a = vehicle_with(
            &[fuel(day(1), 1_000.0, 100.0, 10.0, 120.0)],
            &[service(MaintenanceCategory::Tires, 400.0)],
        );
        let b = vehicle_with(&[fuel(day(2), 2_000.0, 60.0, 12.0, 90.0)], &[]);

        let fleet = fleet_aggregate(&[a, b]);
        assert!((fleet.total_spent - 560.0).abs() < 1e-9);
        assert!((fleet.total_liters - 22.0).abs() < 1e-9);
        assert_eq!(fleet.vehicle_count, 2);

        let empty = fleet_aggregate(&[]);
        assert_eq!(empty.vehicle_count, 0);
        assert!(empty.total_spent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_time_series_is_chronological() {
        let vehicle = vehicle_with(
            &[
                fuel(day(10), 1_000.0, 100.0, 10.0, 120.0),
                fuel(day(2), 900.0, 50.0, 10.0, 80.0),
                fuel(day(10), 1_100.0, 90.0, 10.0, 100.0),
                fuel(day(15), 1_300.0, 40.0, 8.0, 96.0),
            ],
            &[],
        );
        let points = time_series(&vehicle);

        let dates: Vec<_> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(2), day(10), day(10), day(15)]);
        // Same-day entries keep insertion order.
        assert!((points[1].efficiency - 12.0).abs() < 1e-9);
        assert!((points[2].efficiency - 10.0).abs() < 1e-9);
        assert!((points[3].cost_per_km - 40.0 / 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_time_series_is_restartable() {
        let vehicle = vehicle_with(&[fuel(day(1), 1_000.0, 100.0, 10.0, 120.0)], &[]);
        assert_eq!(time_series(&vehicle), time_series(&vehicle));
    }
}
