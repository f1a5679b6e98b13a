//! Database query functions organized by domain.

pub mod accounts;
pub mod capsules;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::{DbError, Result};

/// Format a timestamp for storage (RFC 3339, offset preserved).
pub(crate) fn fmt_ts(ts: DateTime<FixedOffset>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn parse_ts(text: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text)
        .map_err(|e| DbError::Serialization(format!("timestamp '{text}': {e}")))
}

/// Format a calendar date for storage (`YYYY-MM-DD`).
pub(crate) fn fmt_date(date: NaiveDate) -> String {
    date.to_string()
}

pub(crate) fn parse_date(text: &str) -> Result<NaiveDate> {
    text.parse()
        .map_err(|e| DbError::Serialization(format!("date '{text}': {e}")))
}

/// Map a unique-index violation to [`DbError::Constraint`].
pub(crate) fn map_conflict(e: rusqlite::Error, what: &str) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(what.to_string())
        }
        other => DbError::Sqlite(other),
    }
}
