//! Human-readable dates for email personalisation.

use crate::timestamp::SourceTimestamp;
use chrono::{DateTime, Utc};
use chrono_tz::Europe::London;

/// `5 January 2024 at 10:06pm`
const DISPLAY_FORMAT: &str = "%-d %B %Y at %-I:%M%P";

/// Render a source timestamp in UK civil time.
///
/// Offset-less input is taken to be UTC; zoned input is converted to UTC first.
pub fn format_display_date(timestamp: &SourceTimestamp) -> String {
    format_utc_display_date(timestamp.to_utc())
}

/// Like [`format_display_date`], but `None` for a missing or unset timestamp.
pub fn format_optional_display_date(timestamp: Option<&SourceTimestamp>) -> Option<String> {
    timestamp
        .filter(|ts| !ts.is_unset())
        .map(format_display_date)
}

pub fn format_utc_display_date(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&London)
        .format(DISPLAY_FORMAT)
        .to_string()
}
