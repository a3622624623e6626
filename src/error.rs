// Engine error kinds
// A collaborator failure is never downgraded to a default decision:
// the calculator must not assume "not a holiday" or "not exempt".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TollError {
    /// The holiday provider could not answer for the passage's year
    #[error("Holiday lookup failed for year {year}: {cause}")]
    HolidayLookup { year: i32, cause: anyhow::Error },

    /// The vehicle registry could not answer for the plate
    #[error("Vehicle registry lookup failed for '{plate}': {cause}")]
    RegistryLookup { plate: String, cause: anyhow::Error },

    /// The fee ledger could not be read or written
    #[error("Fee ledger operation failed for '{plate}': {cause}")]
    Ledger { plate: String, cause: anyhow::Error },
}
