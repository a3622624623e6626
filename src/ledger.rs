// Fee Ledger - per-vehicle history of charged passages
// Entries are append-only; the merge rule may revise an amount upward,
// never downward, and entries are never deleted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

// ============================================================================
// FEE ENTRY
// ============================================================================

/// One charged passage recorded against a vehicle.
///
/// The id is assigned once and survives merge amendments; the amount is
/// always positive (a zero charge is never persisted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEntry {
    pub id: String,
    pub amount: u32,
    pub timestamp: DateTime<Utc>,
}

impl FeeEntry {
    /// Create a new entry with a fresh identity
    pub fn new(amount: u32, timestamp: DateTime<Utc>) -> Self {
        FeeEntry {
            id: uuid::Uuid::new_v4().to_string(),
            amount,
            timestamp,
        }
    }
}

// ============================================================================
// LEDGER TRAIT
// ============================================================================

/// FeeLedger - the calculator's seam for fee storage
///
/// Implementations must return entries in insertion order; the merge rule
/// reconciles against the first entry found in that order.
pub trait FeeLedger: Send + Sync {
    /// All entries recorded for a vehicle, in insertion order
    fn entries_for(&self, license_number: &str) -> Result<Vec<FeeEntry>>;

    /// Append a new entry to a vehicle's history
    fn append(&self, license_number: &str, entry: FeeEntry) -> Result<()>;

    /// Revise the amount of an existing entry (identity and timestamp keep)
    fn amend(&self, license_number: &str, entry_id: &str, new_amount: u32) -> Result<()>;
}

// ============================================================================
// MEMORY LEDGER
// ============================================================================

/// Volatile in-memory ledger, one insertion-ordered list per plate
pub struct MemoryLedger {
    entries: RwLock<HashMap<String, Vec<FeeEntry>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        MemoryLedger {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeLedger for MemoryLedger {
    fn entries_for(&self, license_number: &str) -> Result<Vec<FeeEntry>> {
        let entries = self.entries.read().unwrap();
        Ok(entries.get(license_number).cloned().unwrap_or_default())
    }

    fn append(&self, license_number: &str, entry: FeeEntry) -> Result<()> {
        let mut entries = self.entries.write().unwrap();
        entries
            .entry(license_number.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }

    fn amend(&self, license_number: &str, entry_id: &str, new_amount: u32) -> Result<()> {
        let mut entries = self.entries.write().unwrap();

        let history = entries
            .get_mut(license_number)
            .with_context(|| format!("No fee history for vehicle '{}'", license_number))?;

        let entry = history
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .with_context(|| {
                format!(
                    "No fee entry '{}' for vehicle '{}'",
                    entry_id, license_number
                )
            })?;

        entry.amount = new_amount;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
