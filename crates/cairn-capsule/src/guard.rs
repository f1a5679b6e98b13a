//! Ownership checks.
//!
//! The guard runs after lookup, never instead of it: a missing capsule stays
//! `NotFound` and a foreign one becomes `Forbidden`, so the two outcomes are
//! never collapsed into each other.

use cairn_types::{capsule::Capsule, AccountId};

use crate::{CapsuleError, Result};

/// Whether `requester` owns `capsule`.
pub fn is_owner(capsule: &Capsule, requester: AccountId) -> bool {
    capsule.owner_id == requester
}

/// Fail with [`CapsuleError::Forbidden`] unless `requester` owns `capsule`.
pub fn ensure_owner(capsule: &Capsule, requester: AccountId) -> Result<()> {
    if is_owner(capsule, requester) {
        Ok(())
    } else {
        Err(CapsuleError::Forbidden)
    }
}
