//! Run scheduling — determines when the next crawl run is due.

use chrono::{DateTime, Duration, Utc};

/// Returns true if a run is due: either no run has happened yet, or the
/// last run started at least `interval_hours` before `now`.
///
/// An unreadable `last_run_at` counts as due; an unreadable `now` does
/// not.
#[must_use]
pub fn is_run_due(last_run_at: Option<&str>, interval_hours: u32, now: &str) -> bool {
    let Ok(current) = DateTime::parse_from_rfc3339(now) else {
        return false;
    };
    match last_run_at.map(DateTime::parse_from_rfc3339) {
        None | Some(Err(_)) => true,
        Some(Ok(last)) => last + Duration::hours(i64::from(interval_hours)) <= current,
    }
}

/// RFC 3339 timestamp for `now + interval_hours`.
#[must_use]
pub fn next_run_timestamp(interval_hours: u32) -> String {
    let next = Utc::now() + Duration::hours(i64::from(interval_hours));
    next.to_rfc3339()
}
