//! Date/time utilities for Gator.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings with
//! microsecond precision, so comparing the stored text orders rows
//! chronologically.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

/// Format a timestamp for storage.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time formatted for storage.
pub fn now_db_timestamp() -> String {
    to_db_timestamp(&Utc::now())
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and the plain SQLite `YYYY-MM-DD HH:MM:SS` form.
pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Format a DateTime<Utc> in the specified timezone.
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}

/// Format with the default `YYYY/MM/DD HH:MM` layout.
pub fn format_utc_datetime_default(dt: &DateTime<Utc>, timezone: &str) -> String {
    format_utc_datetime(dt, timezone, "%Y/%m/%d %H:%M")
}
