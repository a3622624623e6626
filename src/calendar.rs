// Calendar rules - weekend and holiday predicates
// Either predicate being true makes the whole day toll-free.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::holidays::Holiday;

/// Check if a date falls on a Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Check if a date matches any holiday in the given set.
/// Only the (year, month, day) triple is compared.
pub fn is_holiday(date: NaiveDate, holidays: &[Holiday]) -> bool {
    holidays.iter().any(|holiday| holiday.date == date)
}
