//! Lenient deserializers for the backend's date and flag encodings.
//!
//! Depending on the endpoint the backend emits `LocalDate` as `"2025-03-01"`,
//! as a full ISO datetime, or as a `[year, month, day]` array, and booleans
//! occasionally as `0`/`1`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Parts(Vec<i64>),
}

/// Parse a calendar date from the formats the backend produces.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    parse_datetime(text).map(|dt| dt.date())
}

/// Parse a local datetime, accepting an explicit offset or `Z` suffix.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn date_from_parts(parts: &[i64]) -> Option<NaiveDate> {
    match parts {
        [y, m, d, ..] => NaiveDate::from_ymd_opt(*y as i32, *m as u32, *d as u32),
        _ => None,
    }
}

/// `deserialize_with` for `Option<NaiveDate>`; unparseable input becomes `None`.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDate>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawDate::Text(text)) => parse_date(&text),
        Some(RawDate::Parts(parts)) => date_from_parts(&parts),
        None => None,
    })
}

/// `deserialize_with` for `Option<NaiveDateTime>`.
pub fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawDate>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawDate::Text(text)) => parse_datetime(&text),
        Some(RawDate::Parts(parts)) => {
            let date = date_from_parts(&parts);
            let hms = |i: usize| parts.get(i).copied().unwrap_or(0) as u32;
            date.and_then(|d| d.and_hms_opt(hms(3), hms(4), hms(5)))
        }
        None => None,
    })
}

/// `deserialize_with` for `Option<bool>` accepting `true/false` or `1/0`.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawBool {
        Bool(bool),
        Int(i64),
    }

    Ok(Option::<RawBool>::deserialize(deserializer)?.map(|raw| match raw {
        RawBool::Bool(b) => b,
        RawBool::Int(n) => n != 0,
    }))
}
