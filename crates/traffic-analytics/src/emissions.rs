use serde::{Deserialize, Serialize};
use trajectory_store::VehicleClass;

/// Cumulative first-seen vehicle tallies, one slot per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub car: u64,
    pub bus: u64,
    pub truck: u64,
    pub motorcycle: u64,
    pub bicycle: u64,
    pub unknown: u64,
}

impl ClassCounts {
    pub fn increment(&mut self, class: VehicleClass) {
        match class {
            VehicleClass::Car => self.car += 1,
            VehicleClass::Bus => self.bus += 1,
            VehicleClass::Truck => self.truck += 1,
            VehicleClass::Motorcycle => self.motorcycle += 1,
            VehicleClass::Bicycle => self.bicycle += 1,
            VehicleClass::Unknown => self.unknown += 1,
        }
    }

    pub fn count(&self, class: VehicleClass) -> u64 {
        match class {
            VehicleClass::Car => self.car,
            VehicleClass::Bus => self.bus,
            VehicleClass::Truck => self.truck,
            VehicleClass::Motorcycle => self.motorcycle,
            VehicleClass::Bicycle => self.bicycle,
            VehicleClass::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u64 {
        VehicleClass::ALL.iter().map(|class| self.count(*class)).sum()
    }
}

/// Per-class emission factors in grams per minute of presence.
///
/// Defaults follow common urban fleet averages; bicycles are zero and
/// unclassified detections contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactors {
    pub car: f64,
    pub bus: f64,
    pub truck: f64,
    pub motorcycle: f64,
    pub bicycle: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            car: 120.0,
            bus: 450.0,
            truck: 500.0,
            motorcycle: 60.0,
            bicycle: 0.0,
        }
    }
}

impl EmissionFactors {
    pub fn factor(&self, class: VehicleClass) -> f64 {
        match class {
            VehicleClass::Car => self.car,
            VehicleClass::Bus => self.bus,
            VehicleClass::Truck => self.truck,
            VehicleClass::Motorcycle => self.motorcycle,
            VehicleClass::Bicycle => self.bicycle,
            VehicleClass::Unknown => 0.0,
        }
    }

    /// Gram-per-second estimate over cumulative counts.
    pub fn estimate(&self, counts: &ClassCounts) -> f64 {
        let per_minute: f64 = VehicleClass::ALL
            .iter()
            .map(|class| counts.count(*class) as f64 * self.factor(*class))
            .sum();
        per_minute / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_increment_per_class() {
        let mut counts = ClassCounts::default();
        counts.increment(VehicleClass::Car);
        counts.increment(VehicleClass::Car);
        counts.increment(VehicleClass::Truck);
        assert_eq!(counts.car, 2);
        assert_eq!(counts.truck, 1);
        assert_eq!(counts.bus, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_estimate_two_cars_one_bus() {
        let mut counts = ClassCounts::default();
        counts.increment(VehicleClass::Car);
        counts.increment(VehicleClass::Car);
        counts.increment(VehicleClass::Bus);
        let estimate = EmissionFactors::default().estimate(&counts);
        assert!((estimate - 11.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_and_bicycle_emit_nothing() {
        let mut counts = ClassCounts::default();
        counts.increment(VehicleClass::Unknown);
        counts.increment(VehicleClass::Bicycle);
        assert_eq!(EmissionFactors::default().estimate(&counts), 0.0);
        assert_eq!(counts.total(), 2);
    }
}
