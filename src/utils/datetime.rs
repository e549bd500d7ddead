//! Date and time utility functions
//!
//! Archive stamps and deadlines are stored in UTC and shown in local time.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};

/// Input formats accepted for deadlines besides RFC 3339, interpreted as local time
const LOCAL_DEADLINE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Format a UTC timestamp in local time
///
/// # Arguments
/// * `at` - The timestamp to format
/// * `format` - strftime format string
pub fn format_timestamp(at: DateTime<Utc>, format: &str) -> String {
    at.with_timezone(&Local).format(format).to_string()
}

/// Parse a deadline entered by the user
///
/// Accepts RFC 3339 (e.g., "2025-01-15T14:30:00Z") or a local date and time
/// such as "2025-01-15T14:30" or "2025-01-15 14:30".
///
/// # Returns
/// * `Result<DateTime<Utc>, chrono::ParseError>` - The deadline in UTC or the last parse error
pub fn parse_deadline(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let input = input.trim();
    let mut last_error = match DateTime::parse_from_rfc3339(input) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };

    for format in LOCAL_DEADLINE_FORMATS {
        match NaiveDateTime::parse_from_str(input, format) {
            Ok(naive) => {
                let local = Local
                    .from_local_datetime(&naive)
                    .single()
                    .unwrap_or_else(|| Local.from_utc_datetime(&naive));
                return Ok(local.with_timezone(&Utc));
            }
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

/// Compact description of a duration, e.g. "2d 3h", "45m", "<1m"
pub fn format_duration_short(duration: Duration) -> String {
    let minutes = duration.num_minutes().abs();
    let (days, hours, mins) = (minutes / (24 * 60), (minutes / 60) % 24, minutes % 60);
    match (days, hours, mins) {
        (0, 0, 0) => "<1m".to_string(),
        (0, 0, m) => format!("{}m", m),
        (0, h, m) => format!("{}h {}m", h, m),
        (d, h, _) => format!("{}d {}h", d, h),
    }
}

/// Describe a deadline relative to `now`, e.g. "in 3h 10m" or "overdue by 1d 2h"
pub fn describe_deadline(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = deadline - now;
    if remaining <= Duration::zero() {
        format!("overdue by {}", format_duration_short(remaining))
    } else {
        format!("in {}", format_duration_short(remaining))
    }
}
