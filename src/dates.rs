//! Month-precision date handling
//!
//! Subscriptions carry month-granularity dates received on the wire as
//! `MM-YYYY` strings. This module parses that format and provides the month
//! arithmetic the cost aggregator needs.

use chrono::{DateTime, Datelike, Duration, LocalResult, TimeZone, Utc};
use thiserror::Error;

/// Errors produced when parsing an `MM-YYYY` string
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateParseError {
    /// Input was not two hyphen-separated fields of the expected widths
    #[error("invalid date format, expected MM-YYYY")]
    Format,
    /// Month field was not a number in 1..=12
    #[error("invalid month")]
    Month,
    /// Year field was not a four-digit number
    #[error("invalid year")]
    Year,
}

/// Parse an `MM-YYYY` string into midnight UTC on the first day of that month.
///
/// Strict: exactly two fields, a two-digit month in 1..=12 and a four-digit
/// year. `"07-2025"` parses; `"7-25"` does not.
pub fn parse_month_year(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let parts: Vec<&str> = input.split('-').collect();
    if parts.len() != 2 {
        return Err(DateParseError::Format);
    }

    if parts[0].len() != 2 {
        return Err(DateParseError::Month);
    }
    let month: u32 = parts[0].parse().map_err(|_| DateParseError::Month)?;
    if !(1..=12).contains(&month) {
        return Err(DateParseError::Month);
    }

    if parts[1].len() != 4 {
        return Err(DateParseError::Year);
    }
    let year: i32 = parts[1].parse().map_err(|_| DateParseError::Year)?;

    match Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0) {
        LocalResult::Single(date) => Ok(date),
        _ => Err(DateParseError::Format),
    }
}

/// Midnight UTC on the last day of `month_start`'s month.
///
/// Computed as the first day of the following month minus one day, so the
/// time-of-day stays zeroed.
pub fn end_of_month(month_start: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = (month_start.year(), month_start.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0) {
        LocalResult::Single(next) => next - Duration::days(1),
        // Unreachable for UTC, which has no ambiguous local times
        _ => month_start,
    }
}
