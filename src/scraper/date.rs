//! Publication date parsing.
//!
//! Feeds in the wild use several date layouts. Layouts are tried in a fixed
//! order and the first match wins.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::DateParseError;

/// Supported layouts, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `Mon, 02 Jan 2006 15:04:05 -0700`
    Rfc1123Z,
    /// `02 Jan 06 15:04 -0700`
    Rfc822Z,
    /// `02 Jan 06 15:04 MST`
    Rfc822,
    /// `Mon, 02 Jan 2006 15:04:05 MST`
    Rfc1123,
    /// `2006-01-02`, taken as midnight UTC
    Date,
}

/// Layouts in the order they are tried.
pub const LAYOUTS: [DateLayout; 5] = [
    DateLayout::Rfc1123Z,
    DateLayout::Rfc822Z,
    DateLayout::Rfc822,
    DateLayout::Rfc1123,
    DateLayout::Date,
];

impl DateLayout {
    /// Parse `s` with this layout.
    pub fn parse(self, s: &str) -> Option<DateTime<Utc>> {
        match self {
            DateLayout::Rfc1123Z => parse_numeric_zone(s, "%d %b %Y %H:%M:%S %z"),
            DateLayout::Rfc822Z => parse_numeric_zone(s, "%d %b %y %H:%M %z"),
            DateLayout::Rfc822 => parse_named_zone(s, "%d %b %y %H:%M"),
            DateLayout::Rfc1123 => parse_named_zone(s, "%d %b %Y %H:%M:%S"),
            DateLayout::Date => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
        }
    }
}

/// Parse an item publication date.
///
/// Surrounding whitespace is ignored. The weekday prefix, when present, is
/// not checked against the date.
pub fn parse_pub_date(input: &str) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = input.trim();
    LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(trimmed))
        .ok_or_else(|| DateParseError {
            input: trimmed.to_string(),
        })
}

fn parse_numeric_zone(s: &str, format: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(strip_weekday(s), format)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_named_zone(s: &str, format: &str) -> Option<DateTime<Utc>> {
    let (rest, zone) = s.rsplit_once(' ')?;
    let offset = zone_offset(zone)?;
    let naive = NaiveDateTime::parse_from_str(strip_weekday(rest), format).ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Drop a leading `Mon, ` style weekday.
fn strip_weekday(s: &str) -> &str {
    match s.split_once(',') {
        Some((day, rest)) if day.len() <= 9 && day.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest.trim_start()
        }
        _ => s,
    }
}

/// Offset for a zone abbreviation.
///
/// Unknown alphabetic abbreviations are read as UTC.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || zone.len() > 5 || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let hours = match zone.to_ascii_uppercase().as_str() {
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => 0,
    };
    FixedOffset::east_opt(hours * 3600)
}
