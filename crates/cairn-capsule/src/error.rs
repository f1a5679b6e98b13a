//! Typed failure taxonomy for capsule operations.
//!
//! Callers branch on these variants directly; nothing downstream should ever
//! need to inspect message text to tell outcomes apart. In particular,
//! `NotFound` and `Forbidden` stay distinct: "no such capsule" and "not your
//! capsule" are different answers.

use cairn_db::DbError;

/// Error types for capsule operations.
#[derive(Debug, thiserror::Error)]
pub enum CapsuleError {
    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The record exists but the caller does not own it.
    #[error("access denied")]
    Forbidden,

    /// The release date is not strictly in the future.
    #[error("invalid release date: {0}")]
    InvalidDate(String),

    /// A request field failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The share or invite token does not resolve to a capsule.
    #[error("invalid token")]
    InvalidToken,

    /// The capsule is still locked; disclosure refused.
    #[error("capsule is not unlocked yet")]
    NotUnlocked,

    /// The record store failed.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}

/// Convenience result type for capsule operations.
pub type Result<T> = std::result::Result<T, CapsuleError>;
