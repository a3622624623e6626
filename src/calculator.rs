// 🚦 Toll Calculator - the charge decision procedure
// Orchestrates the vehicle registry, calendar rules, rate schedule and fee
// ledger to decide and record the charge for one passage.
//
// Decision order for a passage:
// 1. Exempt vehicle type        → 0, nothing written
// 2. Weekend or public holiday  → 0, nothing written
// 3. Daily total already >= cap → 0, nothing written
// 4. Rate lookup; free slot     → 0, nothing written
// 5. Merge window: an entry within ±1h absorbs a lower-or-equal rate,
//    is amended upward by a higher one, and a fresh entry is created
//    when no entry is that close.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::calendar;
use crate::error::TollError;
use crate::holidays::HolidayProvider;
use crate::ledger::{FeeEntry, FeeLedger};
use crate::schedule::TimeSlotTable;
use crate::vehicles::{normalize_plate, VehicleRegistry};

/// Maximum total charge per vehicle and calendar day
pub const DAILY_FEE_CAP: u32 = 60;

/// One line of a vehicle's toll history, timestamp rendered in the
/// tariff zone's local civil time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TollRecord {
    pub amount: u32,
    pub timestamp: String,
}

// ============================================================================
// TOLL CALCULATOR
// ============================================================================

/// The toll-fee calculation engine.
///
/// Collaborators are injected once at construction; substituting fakes
/// makes every decision path deterministic under test. Registrations for
/// the same plate serialize on a per-vehicle gate, different plates run
/// in parallel.
pub struct TollCalculator {
    holidays: Arc<dyn HolidayProvider>,
    vehicles: Arc<dyn VehicleRegistry>,
    ledger: Arc<dyn FeeLedger>,
    schedule: TimeSlotTable,
    zone: Tz,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TollCalculator {
    /// Create a calculator with the Gothenburg schedule and tariff zone
    pub fn new(
        holidays: Arc<dyn HolidayProvider>,
        vehicles: Arc<dyn VehicleRegistry>,
        ledger: Arc<dyn FeeLedger>,
    ) -> Self {
        TollCalculator {
            holidays,
            vehicles,
            ledger,
            schedule: TimeSlotTable::gothenburg(),
            zone: chrono_tz::Europe::Stockholm,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the rate schedule
    pub fn with_schedule(mut self, schedule: TimeSlotTable) -> Self {
        self.schedule = schedule;
        self
    }

    /// Replace the tariff zone
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    /// Decide and record the charge for one passage.
    ///
    /// Returns the charged amount, 0 when nothing was charged or recorded.
    /// A collaborator failure propagates; it is never treated as "free".
    pub fn register_toll_fee(
        &self,
        license_number: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<u32, TollError> {
        let plate = normalize_plate(license_number);

        // One registration at a time per vehicle: the cap and merge
        // decisions read then write the same history.
        let gate = self.gate_for(&plate);
        let _guard = gate.lock().unwrap();

        let toll_fee = self.calculate_toll_fee(&plate, timestamp)?;
        if toll_fee == 0 {
            return Ok(0);
        }

        match self.recent_toll(&plate, timestamp)? {
            Some(recent) if recent.amount >= toll_fee => Ok(0),
            Some(recent) => {
                self.ledger
                    .amend(&plate, &recent.id, toll_fee)
                    .map_err(|cause| TollError::Ledger {
                        plate: plate.clone(),
                        cause,
                    })?;
                Ok(toll_fee)
            }
            None => {
                self.ledger
                    .append(&plate, FeeEntry::new(toll_fee, timestamp))
                    .map_err(|cause| TollError::Ledger {
                        plate: plate.clone(),
                        cause,
                    })?;
                Ok(toll_fee)
            }
        }
    }

    fn calculate_toll_fee(&self, plate: &str, timestamp: DateTime<Utc>) -> Result<u32, TollError> {
        if self.is_toll_free_vehicle(plate)? {
            return Ok(0);
        }

        let local = timestamp.with_timezone(&self.zone);
        let date = local.date_naive();

        if calendar::is_weekend(date) {
            return Ok(0);
        }

        let holidays = self
            .holidays
            .holidays_for_year(date.year())
            .map_err(|cause| TollError::HolidayLookup {
                year: date.year(),
                cause,
            })?;

        if calendar::is_holiday(date, &holidays) {
            return Ok(0);
        }

        if self.total_for_day(plate, date)? >= DAILY_FEE_CAP {
            return Ok(0);
        }

        Ok(self.schedule.rate_at(local.hour() * 60 + local.minute()))
    }

    fn is_toll_free_vehicle(&self, plate: &str) -> Result<bool, TollError> {
        let vehicle_type =
            self.vehicles
                .type_of(plate)
                .map_err(|cause| TollError::RegistryLookup {
                    plate: plate.to_string(),
                    cause,
                })?;

        // Unregistered plates are charged.
        match vehicle_type {
            Some(vehicle_type) => Ok(self.vehicles.exempt_types().contains(&vehicle_type)),
            None => Ok(false),
        }
    }

    /// Sum of entries on the given local civil day
    fn total_for_day(&self, plate: &str, date: NaiveDate) -> Result<u32, TollError> {
        let total = self
            .entries_for(plate)?
            .iter()
            .filter(|entry| entry.timestamp.with_timezone(&self.zone).date_naive() == date)
            .map(|entry| entry.amount)
            .sum();

        Ok(total)
    }

    /// First entry in stored order strictly inside (timestamp - 1h, timestamp + 1h)
    fn recent_toll(
        &self,
        plate: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<FeeEntry>, TollError> {
        let window = Duration::hours(1);

        Ok(self.entries_for(plate)?.into_iter().find(|entry| {
            entry.timestamp > timestamp - window && entry.timestamp < timestamp + window
        }))
    }

    // ========================================================================
    // READ ACCESSORS
    // ========================================================================

    /// All-time total recorded for a vehicle
    pub fn total_toll_for_vehicle(&self, license_number: &str) -> Result<u32, TollError> {
        let plate = normalize_plate(license_number);
        Ok(self.entries_for(&plate)?.iter().map(|entry| entry.amount).sum())
    }

    /// A vehicle's history for display, in insertion order
    pub fn toll_history_for(&self, license_number: &str) -> Result<Vec<TollRecord>, TollError> {
        let plate = normalize_plate(license_number);

        Ok(self
            .entries_for(&plate)?
            .into_iter()
            .map(|entry| TollRecord {
                amount: entry.amount,
                timestamp: entry
                    .timestamp
                    .with_timezone(&self.zone)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            })
            .collect())
    }

    fn entries_for(&self, plate: &str) -> Result<Vec<FeeEntry>, TollError> {
        self.ledger
            .entries_for(plate)
            .map_err(|cause| TollError::Ledger {
                plate: plate.to_string(),
                cause,
            })
    }

    fn gate_for(&self, plate: &str) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().unwrap();
        gates
            .entry(plate.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

// ============================================================================
// TESTS
// ============================================================================
