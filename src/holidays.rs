// 📅 Holiday Provider - public holiday lookup with a layered cache
// Resolution order: memory cache → JSON file cache → remote API.
//
// The calculator never interprets a lookup failure as "no holidays";
// a provider error always propagates to the caller.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Holiday API queried when neither cache tier has the requested year
pub const HOLIDAYS_API_URL: &str = "https://api.dagsmart.se/holidays";

// ============================================================================
// HOLIDAY
// ============================================================================

/// Localized holiday name as delivered by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayName {
    pub en: String,
    pub sv: String,
}

/// One public holiday. Only the calendar date takes part in toll
/// decisions; code and name are carried for display and the file cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub code: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<HolidayName>,
}

impl Holiday {
    pub fn new(date: NaiveDate, code: &str) -> Self {
        Holiday {
            date,
            code: code.to_string(),
            name: None,
        }
    }
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// HolidayProvider - the calculator's seam for public-holiday data
///
/// # Returns
/// * `Ok(Vec<Holiday>)` - the complete set for the year
/// * `Err(anyhow::Error)` - the year could not be resolved
pub trait HolidayProvider: Send + Sync {
    /// All public holidays for the given year
    fn holidays_for_year(&self, year: i32) -> Result<Vec<Holiday>>;
}

// ============================================================================
// STATIC PROVIDER
// ============================================================================

/// Fixed in-memory holiday sets, keyed by year.
///
/// Errors for years it has no data for, so a misconfigured installation
/// fails loudly instead of waving every passage through.
pub struct StaticHolidayProvider {
    by_year: HashMap<i32, Vec<Holiday>>,
}

impl StaticHolidayProvider {
    pub fn new() -> Self {
        StaticHolidayProvider {
            by_year: HashMap::new(),
        }
    }

    /// Add (or replace) the holiday set for one year
    pub fn with_year(mut self, year: i32, holidays: Vec<Holiday>) -> Self {
        self.by_year.insert(year, holidays);
        self
    }
}

impl Default for StaticHolidayProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HolidayProvider for StaticHolidayProvider {
    fn holidays_for_year(&self, year: i32) -> Result<Vec<Holiday>> {
        self.by_year
            .get(&year)
            .cloned()
            .with_context(|| format!("No holiday data for year {}", year))
    }
}

// ============================================================================
// CACHED PROVIDER
// ============================================================================

/// Layered holiday provider: memory cache, then `<dir>/<year>.json`,
/// then the remote API (feature `remote-holidays`).
///
/// Construct once and inject into the calculator; the memory cache is
/// shared across all lookups through the same instance.
pub struct CachedHolidayProvider {
    cache_dir: PathBuf,
    memory: RwLock<HashMap<i32, Vec<Holiday>>>,
}

impl CachedHolidayProvider {
    pub fn new<P: Into<PathBuf>>(cache_dir: P) -> Self {
        CachedHolidayProvider {
            cache_dir: cache_dir.into(),
            memory: RwLock::new(HashMap::new()),
        }
    }

    fn cache_path(&self, year: i32) -> PathBuf {
        self.cache_dir.join(format!("{}.json", year))
    }

    fn load_from_file(&self, year: i32) -> Result<Vec<Holiday>> {
        let path = self.cache_path(year);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read holiday cache file: {:?}", path))?;

        let holidays: Vec<Holiday> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse holiday cache file: {:?}", path))?;

        Ok(holidays)
    }

    fn save_to_file(&self, year: i32, holidays: &[Holiday]) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("Failed to create holiday cache dir: {:?}", self.cache_dir))?;

        let json = serde_json::to_string_pretty(holidays)?;
        let path = self.cache_path(year);
        fs::write(&path, json)
            .with_context(|| format!("Failed to write holiday cache file: {:?}", path))?;

        Ok(())
    }

    #[cfg(feature = "remote-holidays")]
    fn fetch_from_api(&self, year: i32) -> Result<Vec<Holiday>> {
        let holidays: Vec<Holiday> = reqwest::blocking::Client::new()
            .get(HOLIDAYS_API_URL)
            .query(&[("year", year)])
            .send()
            .with_context(|| format!("Holiday API request failed for year {}", year))?
            .error_for_status()
            .with_context(|| format!("Holiday API rejected request for year {}", year))?
            .json()
            .with_context(|| format!("Failed to decode holiday API response for year {}", year))?;

        self.save_to_file(year, &holidays)?;

        Ok(holidays)
    }

    #[cfg(not(feature = "remote-holidays"))]
    fn fetch_from_api(&self, year: i32) -> Result<Vec<Holiday>> {
        anyhow::bail!(
            "No cached holidays for year {} (rebuild with --features remote-holidays to fetch from {})",
            year,
            HOLIDAYS_API_URL
        )
    }

    fn remember(&self, year: i32, holidays: &[Holiday]) {
        self.memory
            .write()
            .unwrap()
            .insert(year, holidays.to_vec());
    }
}

impl HolidayProvider for CachedHolidayProvider {
    fn holidays_for_year(&self, year: i32) -> Result<Vec<Holiday>> {
        if let Some(holidays) = self.memory.read().unwrap().get(&year) {
            return Ok(holidays.clone());
        }

        if let Ok(holidays) = self.load_from_file(year) {
            self.remember(year, &holidays);
            return Ok(holidays);
        }

        let holidays = self.fetch_from_api(year)?;
        self.remember(year, &holidays);

        Ok(holidays)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_static_provider_known_year() {
        let provider = StaticHolidayProvider::new().with_year(
            2025,
            vec![
                Holiday::new(date(2025, 1, 1), "newYearsDay"),
                Holiday::new(date(2025, 1, 6), "epiphany"),
            ],
        );

        let holidays = provider.holidays_for_year(2025).unwrap();
        assert_eq!(holidays.len(), 2);
        assert_eq!(holidays[0].code, "newYearsDay");
    }

    #[test]
    fn test_static_provider_unknown_year_is_an_error() {
        let provider = StaticHolidayProvider::new();
        assert!(provider.holidays_for_year(2025).is_err());
    }

    #[test]
    fn test_holiday_json_round_trip() {
        let json = r#"[
            {
                "date": "2025-01-01",
                "code": "newYearsDay",
                "name": { "en": "New Year's Day", "sv": "Nyårsdagen" }
            },
            { "date": "2025-01-06", "code": "epiphany" }
        ]"#;

        let holidays: Vec<Holiday> = serde_json::from_str(json).unwrap();

        assert_eq!(holidays.len(), 2);
        assert_eq!(holidays[0].date, date(2025, 1, 1));
        assert_eq!(
            holidays[0].name.as_ref().unwrap().sv,
            "Nyårsdagen"
        );
        assert!(holidays[1].name.is_none());
    }

    #[test]
    fn test_cached_provider_reads_file_cache() {
        let dir = std::env::temp_dir().join(format!("toll-holiday-cache-{}", std::process::id()));
        let provider = CachedHolidayProvider::new(&dir);

        let holidays = vec![Holiday::new(date(2025, 6, 6), "nationalDay")];
        provider.save_to_file(2025, &holidays).unwrap();

        let loaded = provider.holidays_for_year(2025).unwrap();
        assert_eq!(loaded, holidays);

        // Second lookup is served from memory even if the file disappears.
        fs::remove_file(provider.cache_path(2025)).unwrap();
        let cached = provider.holidays_for_year(2025).unwrap();
        assert_eq!(cached, holidays);

        let _ = fs::remove_dir_all(&dir);
    }

    #[cfg(not(feature = "remote-holidays"))]
    #[test]
    fn test_cached_provider_errors_without_any_tier() {
        let dir = std::env::temp_dir().join(format!("toll-holiday-missing-{}", std::process::id()));
        let provider = CachedHolidayProvider::new(&dir);

        assert!(provider.holidays_for_year(1999).is_err());
    }
}
