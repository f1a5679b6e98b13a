//! Collaborator-set codec.
//!
//! The store keeps a capsule's collaborators as a JSON array of account ids in
//! a single TEXT column. This module is the only place that text shape exists;
//! everything above it works with a duplicate-free, order-preserving
//! `Vec<AccountId>`.

use cairn_types::AccountId;

use crate::{DbError, Result};

/// Encode a collaborator list for storage. Duplicates are dropped,
/// first-occurrence order is kept.
pub fn encode(ids: &[AccountId]) -> Result<String> {
    serde_json::to_string(&dedup(ids)).map_err(|e| DbError::Serialization(e.to_string()))
}

/// Decode a stored collaborator column. Empty text decodes to an empty list;
/// any duplicates that crept into storage are suppressed on the way out.
pub fn decode(text: &str) -> Result<Vec<AccountId>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<AccountId> = serde_json::from_str(text)
        .map_err(|e| DbError::Serialization(format!("collaborator list: {e}")))?;
    Ok(dedup(&ids))
}

fn dedup(ids: &[AccountId]) -> Vec<AccountId> {
    // Lists are small; a linear scan keeps first-occurrence order.
    let mut out: Vec<AccountId> = Vec::with_capacity(ids.len());
    for &id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
