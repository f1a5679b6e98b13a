//! Civil-time helpers pinned to the service timezone.
//!
//! All calendar decisions (release-date validation, the unlock sweep cutoff,
//! countdown arithmetic) use the same fixed UTC+9 offset so that "today" is
//! unambiguous regardless of where the process runs.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Offset of the service civil timezone from UTC, in seconds (UTC+9).
pub const CIVIL_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// The fixed civil timezone used for every calendar decision.
pub fn civil_offset() -> FixedOffset {
    FixedOffset::east_opt(CIVIL_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current instant in the civil timezone.
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&civil_offset())
}

/// Current calendar date in the civil timezone.
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Whole calendar days from `today` until `date`.
///
/// Plain subtraction: negative for past dates, zero for today.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}
