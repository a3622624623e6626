// SQLite-backed fee ledger
// Durable FeeLedger implementation; rowid order preserves insertion order
// so the merge rule sees entries exactly as they were recorded.

use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::ledger::{FeeEntry, FeeLedger};

pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) a ledger database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("Failed to open ledger database: {:?}", path.as_ref()))?;

        // Enable WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::setup_schema(&conn)?;

        Ok(SqliteLedger {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory ledger database (used by tests)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::setup_schema(&conn)?;

        Ok(SqliteLedger {
            conn: Mutex::new(conn),
        })
    }

    fn setup_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS fee_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id TEXT UNIQUE NOT NULL,
                license_number TEXT NOT NULL,
                amount INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_fee_entries_license
             ON fee_entries(license_number)",
            [],
        )?;

        Ok(())
    }
}

impl FeeLedger for SqliteLedger {
    fn entries_for(&self, license_number: &str) -> Result<Vec<FeeEntry>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT entry_id, amount, timestamp
             FROM fee_entries
             WHERE license_number = ?1
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![license_number], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, amount, raw_timestamp) = row?;

            let timestamp = DateTime::parse_from_rfc3339(&raw_timestamp)
                .with_context(|| format!("Corrupt timestamp in fee entry '{}'", id))?
                .with_timezone(&Utc);

            entries.push(FeeEntry {
                id,
                amount: amount as u32,
                timestamp,
            });
        }

        Ok(entries)
    }

    fn append(&self, license_number: &str, entry: FeeEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO fee_entries (entry_id, license_number, amount, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                license_number,
                entry.amount,
                entry.timestamp.to_rfc3339(),
            ],
        )
        .with_context(|| format!("Failed to record fee entry for '{}'", license_number))?;

        Ok(())
    }

    fn amend(&self, license_number: &str, entry_id: &str, new_amount: u32) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        let updated = conn
            .execute(
                "UPDATE fee_entries SET amount = ?1
                 WHERE entry_id = ?2 AND license_number = ?3",
                params![new_amount, entry_id, license_number],
            )
            .with_context(|| format!("Failed to amend fee entry '{}'", entry_id))?;

        ensure!(
            updated == 1,
            "No fee entry '{}' for vehicle '{}'",
            entry_id,
            license_number
        );

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
