// Tariff Schedule - time-of-day rate table
// An ordered table of minute-of-day intervals, scanned first-match-wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// TIME SLOT
// ============================================================================

/// One charging interval of the daily tariff.
///
/// A slot matches a passage when `start <= t <= end` in minutes since
/// midnight, both endpoints inclusive. Adjacent slots therefore end on
/// :29/:59 rather than sharing a boundary minute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,

    /// Flat rate charged for a passage inside this slot
    pub rate: u32,
}

impl TimeSlot {
    pub fn new(start_hour: u32, start_minute: u32, end_hour: u32, end_minute: u32, rate: u32) -> Self {
        TimeSlot {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
            rate,
        }
    }

    fn start(&self) -> u32 {
        self.start_hour * 60 + self.start_minute
    }

    fn end(&self) -> u32 {
        self.end_hour * 60 + self.end_minute
    }

    /// Check if a minute-of-day falls inside this slot (inclusive on both ends)
    pub fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.start() && minute_of_day <= self.end()
    }
}

// ============================================================================
// TIME SLOT TABLE
// ============================================================================

/// The full daily rate schedule.
///
/// Slots are scanned in table order and the first slot containing the
/// passage's minute-of-day wins. Minutes covered by no slot are free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotTable {
    slots: Vec<TimeSlot>,
}

impl TimeSlotTable {
    /// Create a table from an ordered list of slots
    pub fn new(slots: Vec<TimeSlot>) -> Self {
        TimeSlotTable { slots }
    }

    /// Load a schedule from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read schedule file: {:?}", path.as_ref()))?;

        let slots: Vec<TimeSlot> =
            serde_json::from_str(&content).context("Failed to parse schedule JSON")?;

        Ok(TimeSlotTable::new(slots))
    }

    /// The Gothenburg congestion-tax schedule
    pub fn gothenburg() -> Self {
        TimeSlotTable::new(vec![
            TimeSlot::new(6, 0, 6, 29, 8),
            TimeSlot::new(6, 30, 6, 59, 13),
            TimeSlot::new(7, 0, 7, 59, 18),
            TimeSlot::new(8, 0, 8, 29, 13),
            TimeSlot::new(8, 30, 14, 59, 8),
            TimeSlot::new(15, 0, 15, 29, 13),
            TimeSlot::new(15, 30, 16, 59, 18),
            TimeSlot::new(17, 0, 17, 59, 13),
            TimeSlot::new(18, 0, 18, 29, 8),
        ])
    }

    /// Rate for a passage at the given minute-of-day (0 if no slot matches)
    pub fn rate_at(&self, minute_of_day: u32) -> u32 {
        self.slots
            .iter()
            .find(|slot| slot.contains(minute_of_day))
            .map(|slot| slot.rate)
            .unwrap_or(0)
    }

    /// Get number of slots in the schedule
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

impl Default for TimeSlotTable {
    fn default() -> Self {
        Self::gothenburg()
    }
}

// ============================================================================
// TESTS
// ============================================================================
