//! # cairn-types
//!
//! Shared domain types used across the Cairn workspace: capsule and account
//! entities, the response shapes derived from them, and civil-time helpers.

pub mod account;
pub mod capsule;
pub mod time;

/// Store-assigned account identifier.
pub type AccountId = i64;

/// Store-assigned capsule identifier.
pub type CapsuleId = i64;

/// Minimum capsule title length in characters.
pub const TITLE_MIN_CHARS: usize = 1;

/// Maximum capsule title length in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Title prefix applied to capsules created by copying a shared one.
pub const COPY_TITLE_PREFIX: &str = "[Shared] ";
