//! Posted-date parsing for job boards.
//!
//! Boards publish dates in wildly different shapes: ISO timestamps in
//! `datetime` attributes, human-formatted dates, and relative phrases
//! like "3 days ago". This module normalizes them all to UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:about\s+|over\s+)?(\d+)\+?\s*(minute|min|hour|hr|day|week|month)s?\s+ago$")
        .expect("valid regex")
});

/// Parse a posted-date string into a UTC timestamp.
///
/// Tries, in order: relative phrases ("today", "yesterday", "3 days
/// ago"), RFC3339, then each of the supplied chrono formats as a
/// datetime and finally as a bare date (interpreted as midnight UTC).
/// Returns `None` when nothing matches.
#[must_use]
pub fn parse_posted_date(raw: &str, formats: &[String]) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(dt) = parse_relative(text) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

fn parse_relative(text: &str) -> Option<DateTime<Utc>> {
    let lower = text.to_lowercase();
    let now = Utc::now();

    match lower.as_str() {
        "today" | "just now" | "just posted" | "new" => return Some(now),
        "yesterday" => return Some(now - Duration::days(1)),
        _ => {}
    }

    let captures = RELATIVE_RE.captures(&lower)?;
    let amount: i64 = captures.get(1)?.as_str().parse().ok()?;
    let offset = match captures.get(2)?.as_str() {
        "minute" | "min" => Duration::minutes(amount),
        "hour" | "hr" => Duration::hours(amount),
        "day" => Duration::days(amount),
        "week" => Duration::weeks(amount),
        // Months are approximated; job freshness windows are in days
        "month" => Duration::days(amount * 30),
        _ => return None,
    };
    Some(now - offset)
}
