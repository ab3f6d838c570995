//! Calendar and time-of-day helpers
//!
//! Reservations are keyed by calendar date with no timezone attached, and
//! slots by wall-clock time of day. Everything here works on naive values.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};

use crate::{UtilError, UtilResult};

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> UtilResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| UtilError::InvalidDate {
        value: s.to_string(),
        message: e.to_string(),
    })
}

/// Parse a time of day in `HH:MM` or `HH:MM:SS` form
pub fn parse_time(s: &str) -> UtilResult<NaiveTime> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|e| UtilError::InvalidTime {
            value: s.to_string(),
            message: e.to_string(),
        })
}

/// Monday and Sunday of the ISO week containing `date`
pub fn iso_week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = i64::from(date.weekday().num_days_from_monday());
    let monday = date - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

/// Add calendar months, clamping to the last day of the target month.
///
/// Returns `None` only when the result falls outside chrono's date range.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Fractional hours in a duration
pub fn as_hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}

/// Format a duration as hours with one decimal, e.g. `1.5`
pub fn format_hours(duration: Duration) -> String {
    format!("{:.1}", as_hours(duration))
}
