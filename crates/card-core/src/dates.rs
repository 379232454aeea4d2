//! Date validation and conversion to and from the canonical `YYYYMMDD` form.
//!
//! Every function here is total: malformed input yields `false` or `None`,
//! never a panic.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

/// Expected length of a canonical `YYYYMMDD` string.
pub const CANONICAL_DATE_LEN: usize = 8;

/// Input accepted by [`to_canonical_date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput<'a> {
    Text(&'a str),
    Date(NaiveDate),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

impl From<NaiveDate> for DateInput<'_> {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// `true` iff `value` is exactly eight ASCII digits.
#[must_use]
pub fn is_canonical_date(value: &str) -> bool {
    value.len() == CANONICAL_DATE_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// `true` iff `value` is a JSON string of exactly eight ASCII digits.
#[must_use]
pub fn is_canonical_date_value(value: &Value) -> bool {
    value.as_str().is_some_and(is_canonical_date)
}

/// Interpret a canonical string as `YYYYMMDD`.
///
/// Returns `None` for non-canonical input and for dates that do not exist
/// (month 13, February 30, year 0).
#[must_use]
pub fn parse_canonical_date(value: &str) -> Option<NaiveDate> {
    if !is_canonical_date(value) {
        return None;
    }
    let year: i32 = value[..4].parse().ok()?;
    let month: u32 = value[4..6].parse().ok()?;
    let day: u32 = value[6..].parse().ok()?;
    if year == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Normalize a date or date string to `YYYYMMDD`.
///
/// Strings may be `YYYYMMDD`, `YYYY-MM-DD`, or `YYYY/MM/DD`; surrounding
/// whitespace and the separators are stripped before the canonical check.
#[must_use]
pub fn to_canonical_date<'a>(value: impl Into<DateInput<'a>>) -> Option<String> {
    match value.into() {
        DateInput::Date(date) => canonical_from_date(date),
        DateInput::Text(text) => {
            let stripped: String = text
                .trim()
                .chars()
                .filter(|ch| !matches!(ch, '-' | '/'))
                .collect();
            parse_canonical_date(&stripped).map(|_| stripped)
        }
    }
}

/// Normalize any JSON value holding a date string.
#[must_use]
pub fn canonical_from_value(value: &Value) -> Option<String> {
    value.as_str().and_then(|text| to_canonical_date(text))
}

/// Format a date as `YYYYMMDD`. Years outside `1..=9999` have no canonical form.
#[must_use]
pub fn canonical_from_date(date: NaiveDate) -> Option<String> {
    (1..=9999)
        .contains(&date.year())
        .then(|| date.format("%Y%m%d").to_string())
}

/// ISO `YYYY-MM-DD` rendering kept beside a canonical date for date widgets.
#[must_use]
pub fn widget_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
