//! Timestamp display helpers.
//!
//! Notes carry epoch-millisecond timestamps. These helpers turn them into an
//! absolute label (`"Jan 1, 2023, 3:45 PM"`) and a coarse relative label
//! (`"2 hours ago"`).

use chrono::{DateTime, Local, TimeZone, Utc};

const ABSOLUTE_FORMAT: &str = "%b %-d, %Y, %-I:%M %p";

/// Relative-time units, largest first, as `(seconds, singular name)`.
const UNITS: [(i64, &str); 5] = [
    (31_536_000, "year"),
    (2_592_000, "month"),
    (86_400, "day"),
    (3_600, "hour"),
    (60, "minute"),
];

/// Current Unix timestamp in milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a millisecond timestamp as `"Jan 1, 2023, 3:45 PM"` in `tz`.
///
/// Timestamps chrono cannot represent are rendered as the raw number.
pub fn format_timestamp<Tz>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |utc| utc.with_timezone(tz).format(ABSOLUTE_FORMAT).to_string(),
    )
}

/// Format a millisecond timestamp in the local time zone.
pub fn format_timestamp_local(timestamp_ms: i64) -> String {
    format_timestamp(timestamp_ms, &Local)
}

/// Coarse "N units ago" label for `timestamp_ms` relative to `now_ms`.
///
/// Elapsed time is floored to whole seconds and then to the largest unit that
/// fits at least once. Anything under a minute, including timestamps in the
/// future, is `"just now"`.
pub fn time_ago(timestamp_ms: i64, now_ms: i64) -> String {
    let seconds = now_ms.saturating_sub(timestamp_ms).div_euclid(1000);

    for (unit_seconds, name) in UNITS {
        let interval = seconds.div_euclid(unit_seconds);
        if interval >= 1 {
            let plural = if interval == 1 { "" } else { "s" };
            return format!("{interval} {name}{plural} ago");
        }
    }

    "just now".to_string()
}

/// [`time_ago`] measured against the current clock.
pub fn time_ago_now(timestamp_ms: i64) -> String {
    time_ago(timestamp_ms, now_ms())
}
