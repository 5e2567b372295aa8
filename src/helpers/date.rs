//! Date helper functions

use chrono::{DateTime, TimeZone};
use std::fmt::Write;

/// Format a date with a strftime pattern. An invalid pattern falls back to
/// `YYYY-MM-DD` rather than failing the page.
///
/// # Examples
/// ```ignore
/// format_date(&date, "%B %-d, %Y") // -> "January 5, 2024"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::warn!("Invalid date format {:?}, using %Y-%m-%d", format);
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

/// Format a date in ISO 8601 / XML format
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
