//! Internal serde helpers for replica records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(i64),
    Str(String),
}

/// Accept i64 from either a number or a string like "20".
pub fn i64_from_str_or_num<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| D::Error::custom(format!("invalid integer {s:?}: {e}"))),
    }
}

/// Accept an RFC 3339 string or epoch milliseconds; null -> None.
pub fn opt_datetime_from_str_or_millis<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let val: Option<NumOrStr> = Option::deserialize(deserializer)?;
    match val {
        None => Ok(None),
        Some(NumOrStr::Num(ms)) => DateTime::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        Some(NumOrStr::Str(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| D::Error::custom(format!("invalid timestamp {s:?}: {e}"))),
    }
}
