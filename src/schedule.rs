use chrono::{DateTime, Utc};
use std::time::Duration;

/// Whether a quiz accepts attempts at `now`. Missing bounds are open-ended.
pub fn is_open(
    opens_at: Option<DateTime<Utc>>,
    closes_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if let Some(opens) = opens_at {
        if opens > now {
            return false;
        }
    }
    if let Some(closes) = closes_at {
        if closes < now {
            return false;
        }
    }
    true
}

fn elapsed(started_at: DateTime<Utc>, now: DateTime<Utc>) -> chrono::Duration {
    now - started_at
}

pub fn time_limit_exceeded(started_at: DateTime<Utc>, limit: Duration, now: DateTime<Utc>) -> bool {
    match chrono::Duration::from_std(limit) {
        Ok(limit) => elapsed(started_at, now) > limit,
        // Longer than chrono can represent: never exceeded
        Err(_) => false,
    }
}

/// Whole seconds left before the limit, never negative.
pub fn seconds_remaining(started_at: DateTime<Utc>, limit: Duration, now: DateTime<Utc>) -> u64 {
    let limit_secs = i64::try_from(limit.as_secs()).unwrap_or(i64::MAX);
    let used = elapsed(started_at, now).num_seconds();
    limit_secs.saturating_sub(used).max(0) as u64
}
