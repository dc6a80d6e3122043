//! Timestamps with optional zone information.
//!
//! Upstream producers send both offset-less local strings
//! (`2024-01-05T22:06:45`) and RFC 3339 values (`2024-01-05T22:06:45Z`,
//! `2024-01-05T23:06:45+01:00`). The distinction matters for display
//! formatting, so it is kept rather than normalised on the way in.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTimestamp {
    /// No offset on the wire. Treated as UTC.
    Unspecified(NaiveDateTime),
    /// Explicit offset or `Z`.
    Zoned(DateTime<FixedOffset>),
}

impl SourceTimestamp {
    /// The instant in UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            SourceTimestamp::Unspecified(naive) => naive.and_utc(),
            SourceTimestamp::Zoned(zoned) => zoned.with_timezone(&Utc),
        }
    }

    /// `0001-01-01T00:00:00` is what producers emit for "no value".
    pub fn is_unset(&self) -> bool {
        let unset = NaiveDate::from_ymd_opt(1, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        Some(self.to_utc().naive_utc()) == unset
    }
}

impl From<NaiveDateTime> for SourceTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        SourceTimestamp::Unspecified(value)
    }
}

impl From<DateTime<FixedOffset>> for SourceTimestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        SourceTimestamp::Zoned(value)
    }
}

impl From<DateTime<Utc>> for SourceTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        SourceTimestamp::Zoned(value.fixed_offset())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised timestamp '{0}'")]
pub struct TimestampParseError(String);

impl FromStr for SourceTimestamp {
    type Err = TimestampParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
            return Ok(SourceTimestamp::Zoned(zoned));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(SourceTimestamp::Unspecified)
            .ok_or_else(|| TimestampParseError(raw.to_string()))
    }
}

impl fmt::Display for SourceTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTimestamp::Unspecified(naive) => {
                write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f"))
            }
            SourceTimestamp::Zoned(zoned) => f.write_str(&zoned.to_rfc3339()),
        }
    }
}

impl Serialize for SourceTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SourceTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimestampVisitor;

        impl Visitor<'_> for TimestampVisitor {
            type Value = SourceTimestamp;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an ISO 8601 timestamp with or without offset")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(TimestampVisitor)
    }
}
