use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{AppError, Result};

/// Parses a user-supplied instant.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DD[ T]HH:MM:SS` (read as UTC), a bare
/// date (midnight UTC) or epoch seconds/milliseconds.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(epoch) = value.parse::<i64>() {
        // Values this large are milliseconds.
        let parsed = if epoch.abs() >= 100_000_000_000 {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        if let Some(parsed) = parsed {
            return Ok(parsed);
        }
    }
    Err(AppError::InvalidInput(format!("invalid datetime: {}", value)))
}
