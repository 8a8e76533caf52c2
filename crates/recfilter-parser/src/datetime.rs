//! Datetime and duration literal parsing.
//!
//! Kept alongside [`crate::ip`] as the other "typed domain value with a
//! raw surface syntax" module: datetimes are RFC 3339 (case-insensitively,
//! since the lexer accepts lowercase `t`/`z`), and durations accept either
//! a bare integer second count or an `HH:MM:SS` / `DDdHH:MM:SS` clock form,
//! the two shapes `"3600"` and `"15d15:15:15"` name in the time-operand
//! lifting rule.

use chrono::{DateTime, Duration, Utc};

pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = raw.to_uppercase();
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a duration literal: a bare integer (seconds), `HH:MM:SS`, or
/// `DDdHH:MM:SS`.
pub fn parse_timedelta(raw: &str) -> Option<Duration> {
    if let Ok(secs) = raw.parse::<i64>() {
        return Some(Duration::seconds(secs));
    }
    let (days, clock) = match raw.split_once('d') {
        Some((d, rest)) => (d.parse::<i64>().ok()?, rest),
        None => (0, raw),
    };
    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: i64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(
        Duration::days(days)
            + Duration::hours(hours)
            + Duration::minutes(minutes)
            + Duration::seconds(seconds),
    )
}

/// Renders a duration back to its `DDdHH:MM:SS` surface form, dropping
/// the day component when zero so round seconds stay readable.
pub fn format_timedelta(d: Duration) -> String {
    let total_seconds = d.num_seconds();
    let days = total_seconds / 86_400;
    let rest = total_seconds % 86_400;
    let hours = rest / 3600;
    let minutes = (rest % 3600) / 60;
    let seconds = rest % 60;
    if days != 0 {
        format!("{days}d{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}
