//! Lenient decoding helpers for the ReCog server's JSON payloads.
//!
//! The server is a Python/SQLite stack: ids arrive as integers or strings,
//! timestamps arrive as RFC 3339 or as naive SQLite `datetime()` text, and
//! collection fields are sometimes `null` instead of absent.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

/// Timestamps are always normalised to UTC.
pub type Timestamp = DateTime<Utc>;

/// Identifier of any server-side record (operation, insight, pattern, report).
///
/// Serialises as a plain string; deserialises from a JSON string or integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RecordId, E> {
                Ok(RecordId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS[.f]`, naive
/// `YYYY-MM-DD HH:MM:SS[.f]` and bare dates. Naive values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `deserialize_with` target for optional, leniently formatted timestamps.
pub fn opt_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {s}"))),
    }
}

/// `deserialize_with` target that maps an explicit `null` to `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Deserialize)]
    struct Probe {
        id: RecordId,
        #[serde(default, deserialize_with = "opt_timestamp")]
        at: Option<Timestamp>,
        #[serde(default, deserialize_with = "or_default")]
        tags: Vec<String>,
    }

    #[test]
    fn id_from_integer_or_string() {
        let a: Probe = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        let b: Probe = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.as_str(), "42");
    }

    #[test]
    fn id_serialises_as_string() {
        let json = serde_json::to_string(&RecordId::from(7u64)).unwrap();
        assert_eq!(json, "\"7\"");
    }

    #[test]
    fn sqlite_timestamp_is_utc() {
        let ts = parse_timestamp("2025-11-30 14:05:09").unwrap();
        assert_eq!(ts.year(), 2025);
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.second(), 9);
    }

    #[test]
    fn rfc3339_offset_is_normalised() {
        let ts = parse_timestamp("2025-11-30T14:05:09+10:00").unwrap();
        assert_eq!(ts.hour(), 4);
    }

    #[test]
    fn iso_without_offset_and_fraction() {
        let ts = parse_timestamp("2025-11-30T14:05:09.123456").unwrap();
        assert_eq!(ts.minute(), 5);
    }

    #[test]
    fn bare_date() {
        let ts = parse_timestamp("2025-01-02").unwrap();
        assert_eq!(ts.day(), 2);
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn garbage_timestamp_rejected() {
        assert!(parse_timestamp("yesterday").is_none());
        let err = serde_json::from_str::<Probe>(r#"{"id": 1, "at": "yesterday"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn null_fields_default() {
        let p: Probe = serde_json::from_str(r#"{"id": 1, "at": null, "tags": null}"#).unwrap();
        assert!(p.at.is_none());
        assert!(p.tags.is_empty());
    }
}
