//! Wall-clock time-of-day helpers.
//!
//! Zone schedules are stored as `"HH:MM"` strings with no date component.

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

/// Error returned when a time-of-day string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid time of day '{0}', expected HH:MM or HH:MM:SS")]
pub struct TimeOfDayError(pub String);

/// Parses a wall-clock time of day.
///
/// Accepts `"HH:MM"` and `"HH:MM:SS"`, surrounding whitespace ignored.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, TimeOfDayError> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| TimeOfDayError(s.to_string()))
}

/// Formats a time of day as `"HH:MM"`, the format the mobile app writes.
pub fn format_time_of_day(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}
