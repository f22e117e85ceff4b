//! Canonical ledger timestamps.
//!
//! Timestamps are normalized once, when written: UTC, truncated to
//! microseconds, which is the resolution PostgreSQL `TIMESTAMPTZ` keeps.

use chrono::{DateTime, SubsecRound, TimeZone, Utc};

/// Fractional-second digits kept on ledger timestamps.
pub const LEDGER_TIME_DIGITS: u16 = 6;

/// Normalize a timestamp to ledger precision.
#[must_use]
pub fn ledger_time<Tz: TimeZone>(at: &DateTime<Tz>) -> DateTime<Utc> {
    at.with_timezone(&Utc).trunc_subsecs(LEDGER_TIME_DIGITS)
}

/// The current wall-clock time at ledger precision.
#[must_use]
pub fn ledger_now() -> DateTime<Utc> {
    ledger_time(&Utc::now())
}
