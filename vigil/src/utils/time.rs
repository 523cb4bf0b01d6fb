use std::time::SystemTime;
use chrono::{DateTime, ParseError, SecondsFormat, Utc};

/// Returns the current UTC time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Formats a timestamp as fixed-width RFC 3339 with nanoseconds and a `Z` suffix.
///
/// Every stored timestamp uses this form, so comparing the strings in SQL gives
/// the same order as comparing the instants.
/// Example: "2025-09-13T03:49:58.123456789Z"
pub fn to_storage_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses an RFC 3339 formatted string back into a `DateTime<Utc>`.
///
/// # Errors
/// Returns a `ParseError` if the string is not a valid RFC 3339 timestamp.
pub fn parse_rfc3339_string(s: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Converts a filesystem timestamp.
pub fn from_system_time(time: SystemTime) -> DateTime<Utc> {
    time.into()
}

/// Compact UTC stamp used in generated names, e.g. `20250913_034958`.
pub fn name_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d_%H%M%S").to_string()
}
