//! Duration and timestamp bounds
//!
//! Timestamps are stored as fixed-width RFC 3339 text, so every value that
//! reaches storage must sit within four-digit years for text order to match
//! time order.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::constants::MAX_DURATION_MINUTES;
use crate::error::{Error, Result};

/// Minutes as a duration. Accepts 1 up to [`MAX_DURATION_MINUTES`].
pub fn duration_from_minutes(minutes: i64) -> Result<Duration> {
    if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(Error::validation(format!(
            "duration_minutes must be between 1 and {}",
            MAX_DURATION_MINUTES
        )));
    }
    Duration::try_minutes(minutes).ok_or_else(|| Error::validation("duration_minutes out of range"))
}

/// Reject timestamps outside years 1..=9999
pub fn ensure_storable(ts: DateTime<Utc>) -> Result<DateTime<Utc>> {
    if (1..=9999).contains(&ts.year()) {
        Ok(ts)
    } else {
        Err(Error::validation(format!("timestamp out of range: {}", ts)))
    }
}

/// `start + duration`, rejecting overflow and unstorable results
pub fn checked_end(start: DateTime<Utc>, duration: Duration) -> Result<DateTime<Utc>> {
    start
        .checked_add_signed(duration)
        .ok_or_else(|| Error::validation("end time out of range"))
        .and_then(ensure_storable)
}
