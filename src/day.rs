//! Local-day helpers
//!
//! The ledger's canonical day boundary is the date-only string `YYYY-MM-DD`
//! in local time. Every per-day anchor is stored in that form and compared
//! by string equality; no path compares a stored day against a live
//! timestamp.

use chrono::{Local, NaiveDate};

/// Get today's date as YYYY-MM-DD string
pub fn today_string() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Format a date as the canonical day string
pub fn day_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a canonical day string back to a date
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Two claims fall on the same day iff their day strings are equal
pub fn same_day(anchor: Option<&str>, day: &str) -> bool {
    anchor == Some(day)
}
