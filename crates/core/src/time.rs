//! Time helpers shared by the loader, resolver, cleaner, and tracker.
//!
//! Everything here takes `now: DateTime<Utc>` explicitly rather than calling
//! `Utc::now()` internally, so callers (and tests) control the clock.

use chrono::{DateTime, Days, NaiveDate, Utc};

/// The calendar date of a timestamp, UTC.
pub fn date_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// True iff `ts` falls on the same UTC calendar date as `now`.
///
/// Used by the by-email session index read path (I5): a session is only
/// handed to a reader if its `start_time` is "today" relative to `now`.
pub fn is_today(ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date_of(ts) == date_of(now)
}

/// `[today, today + days]` as a pair of dates, inclusive on both ends —
/// the loader's and reconnect-reload's forward window (§4.3, §4.4).
pub fn forward_window(now: DateTime<Utc>, days: u64) -> (NaiveDate, NaiveDate) {
    let today = date_of(now);
    let end = today
        .checked_add_days(Days::new(days))
        .unwrap_or(today);
    (today, end)
}

/// True iff `t` is active at `now`: `start <= now <= end`, inclusive both
/// ends (§3 Rule, §8 "A rule with `endTime = now` is active").
pub fn active_at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start <= now && now <= end
}

/// Whole minutes between two timestamps, floored, never negative.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}
