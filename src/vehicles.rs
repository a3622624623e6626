// 🚗 Vehicle Registry - plate lookup and toll exemptions
// Resolves a license plate to its vehicle type and knows which types
// pass for free.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

// ============================================================================
// VEHICLE TYPE
// ============================================================================

/// The closed set of vehicle categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Tractor,
    Emergency,
    Diplomat,
    Foreign,
    Military,
}

impl VehicleType {
    /// Wire/display name, matching the registry data format
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Tractor => "tractor",
            VehicleType::Emergency => "emergency",
            VehicleType::Diplomat => "diplomat",
            VehicleType::Foreign => "foreign",
            VehicleType::Military => "military",
        }
    }
}

/// Vehicle types that never pay a toll, regardless of time or day
pub const TOLL_FREE_VEHICLES: [VehicleType; 4] = [
    VehicleType::Emergency,
    VehicleType::Diplomat,
    VehicleType::Foreign,
    VehicleType::Military,
];

/// A registered vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub license_number: String,
    pub vehicle_type: VehicleType,
}

/// Canonical form of a license plate: all whitespace removed.
/// Every engine entry point normalizes before touching the ledger, so
/// "ABC 123" and "ABC123" share one fee history.
pub fn normalize_plate(raw: &str) -> String {
    raw.split_whitespace().collect()
}

// ============================================================================
// REGISTRY TRAIT
// ============================================================================

/// VehicleRegistry - the calculator's seam for vehicle data
pub trait VehicleRegistry: Send + Sync {
    /// Resolve a plate to its vehicle type (`None` for unregistered plates)
    fn type_of(&self, license_number: &str) -> Result<Option<VehicleType>>;

    /// The toll-exempt vehicle types
    fn exempt_types(&self) -> Vec<VehicleType>;
}

// ============================================================================
// STATIC REGISTRY
// ============================================================================

/// In-memory plate → type registry
pub struct StaticVehicleRegistry {
    vehicles: HashMap<String, VehicleType>,
}

impl StaticVehicleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        StaticVehicleRegistry {
            vehicles: HashMap::new(),
        }
    }

    /// The seed fleet used by the demo and the server
    pub fn default_fleet() -> Self {
        let mut registry = StaticVehicleRegistry::new();

        registry.register("ABC123", VehicleType::Car);
        registry.register("DEF456", VehicleType::Car);
        registry.register("GHI789", VehicleType::Car);
        registry.register("JKL012", VehicleType::Military);
        registry.register("MNO345", VehicleType::Diplomat);
        registry.register("PQR678", VehicleType::Foreign);
        registry.register("STU901", VehicleType::Tractor);
        registry.register("VWX234", VehicleType::Emergency);

        registry
    }

    /// Load a registry from a CSV file with `license_number,vehicle_type` rows
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open vehicle register: {:?}", path.as_ref()))?;

        Self::from_csv_reader(file)
    }

    /// Load a registry from any CSV source
    pub fn from_csv_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut registry = StaticVehicleRegistry::new();

        for result in rdr.deserialize() {
            let vehicle: Vehicle = result.context("Failed to deserialize vehicle row")?;
            registry.register(&vehicle.license_number, vehicle.vehicle_type);
        }

        Ok(registry)
    }

    /// Register a vehicle (the plate is normalized)
    pub fn register(&mut self, license_number: &str, vehicle_type: VehicleType) {
        self.vehicles
            .insert(normalize_plate(license_number), vehicle_type);
    }

    /// Get number of registered vehicles
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }
}

impl Default for StaticVehicleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleRegistry for StaticVehicleRegistry {
    fn type_of(&self, license_number: &str) -> Result<Option<VehicleType>> {
        Ok(self.vehicles.get(&normalize_plate(license_number)).copied())
    }

    fn exempt_types(&self) -> Vec<VehicleType> {
        TOLL_FREE_VEHICLES.to_vec()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plate_strips_whitespace() {
        assert_eq!(normalize_plate("ABC 123"), "ABC123");
        assert_eq!(normalize_plate("  ABC\t123  "), "ABC123");
        assert_eq!(normalize_plate("ABC123"), "ABC123");
    }

    #[test]
    fn test_default_fleet_lookup() {
        let registry = StaticVehicleRegistry::default_fleet();

        assert_eq!(registry.type_of("ABC123").unwrap(), Some(VehicleType::Car));
        assert_eq!(
            registry.type_of("JKL012").unwrap(),
            Some(VehicleType::Military)
        );
        assert_eq!(registry.type_of("ZZZ999").unwrap(), None);
    }

    #[test]
    fn test_lookup_normalizes_plate() {
        let registry = StaticVehicleRegistry::default_fleet();

        assert_eq!(registry.type_of("ABC 123").unwrap(), Some(VehicleType::Car));
    }

    #[test]
    fn test_exempt_types() {
        let registry = StaticVehicleRegistry::default_fleet();
        let exempt = registry.exempt_types();

        assert!(exempt.contains(&VehicleType::Emergency));
        assert!(exempt.contains(&VehicleType::Diplomat));
        assert!(exempt.contains(&VehicleType::Foreign));
        assert!(exempt.contains(&VehicleType::Military));
        assert!(!exempt.contains(&VehicleType::Car));
        assert!(!exempt.contains(&VehicleType::Motorcycle));
        assert!(!exempt.contains(&VehicleType::Tractor));
    }

    #[test]
    fn test_from_csv_reader() {
        let csv = "license_number,vehicle_type\nABC123,car\nJKL 012,military\n";
        let registry = StaticVehicleRegistry::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(registry.vehicle_count(), 2);
        assert_eq!(registry.type_of("ABC123").unwrap(), Some(VehicleType::Car));
        assert_eq!(
            registry.type_of("JKL012").unwrap(),
            Some(VehicleType::Military)
        );
    }

    #[test]
    fn test_from_csv_reader_rejects_unknown_type() {
        let csv = "license_number,vehicle_type\nABC123,spaceship\n";
        assert!(StaticVehicleRegistry::from_csv_reader(csv.as_bytes()).is_err());
    }
}
