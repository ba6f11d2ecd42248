//! Calendar-day keys for usage accounting
//!
//! Usage is bucketed by the host's local calendar day. A day is identified by
//! its ISO date string (`2026-10-19`), which is also the key used in the
//! persisted usage record.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use crate::error::{Error, Result};

/// Format used for usage record keys
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Key for today's bucket in host local time
pub fn today_key() -> String {
    date_key(&Local::now().date_naive())
}

/// Key for an arbitrary date
pub fn date_key(date: &NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parse and normalise a date key supplied by an operator
///
/// Accepts `today` as a shorthand. Anything else must be `YYYY-MM-DD`.
pub fn parse_date_key(expr: &str) -> Result<String> {
    let expr = expr.trim();

    if expr.eq_ignore_ascii_case("today") {
        return Ok(today_key());
    }

    NaiveDate::parse_from_str(expr, DATE_KEY_FORMAT)
        .map(|date| date_key(&date))
        .map_err(|_| Error::InvalidDateKey(expr.to_string()))
}

/// Time left until the quota resets at the next local midnight
pub fn until_next_reset() -> Duration {
    until_midnight_after(Local::now())
}

fn until_midnight_after<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    let tomorrow = now.date_naive().succ_opt().unwrap_or(NaiveDate::MAX);
    let midnight = tomorrow.and_hms_opt(0, 0, 0).unwrap_or_default();

    // DST gaps can make local midnight ambiguous or nonexistent; take the
    // earliest valid instant and fall back to a full day.
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(reset_at) => reset_at.signed_duration_since(now),
        None => Duration::days(1),
    }
}

/// Render a reset countdown as `"5h 12m"`
pub fn format_countdown(remaining: Duration) -> String {
    let minutes = remaining.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}
