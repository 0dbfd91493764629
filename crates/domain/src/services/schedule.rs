//! Daily schedule windows.

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

use crate::models::ActiveWindow;

/// Returns true when `instant` falls inside the window.
///
/// - `start < end`: active on `[start, end)`.
/// - `start > end`: the window spans midnight, active from `start` until `end`
///   on the next day.
/// - `start == end`: a zero-length window places no restriction, so the zone
///   is active all day.
pub fn is_active(window: &ActiveWindow, instant: NaiveTime) -> bool {
    let ActiveWindow { start, end } = *window;
    if window.is_unrestricted() {
        true
    } else if window.wraps_midnight() {
        instant >= start || instant < end
    } else {
        start <= instant && instant < end
    }
}

/// Wall-clock time of day of `timestamp` at the given UTC offset.
pub fn time_of_day(timestamp: DateTime<Utc>, offset: FixedOffset) -> NaiveTime {
    timestamp.with_timezone(&offset).time()
}
