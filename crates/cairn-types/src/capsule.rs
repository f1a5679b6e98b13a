//! Capsule entity and the response shapes derived from it.
//!
//! A capsule is a time-locked record: content stays hidden until its release
//! date has passed and the unlock sweep has flipped `unlocked`. The response
//! types here are the only shapes handed to callers, and their constructors
//! apply the disclosure rules, so a locked capsule cannot leak content or its
//! audio reference through any surface.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{time, AccountId, CapsuleId};

/// Full capsule record as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Capsule {
    pub id: CapsuleId,
    /// Owning account; immutable for the record's lifetime.
    pub owner_id: AccountId,
    /// Writer of record. Defaults to the owner, survives copying.
    pub author_id: Option<AccountId>,
    pub title: String,
    pub content: String,
    /// Cached audio artifact URL. Set at most once, post-unlock.
    pub audio_ref: Option<String>,
    pub release_date: NaiveDate,
    /// Monotonic: once true, never false again.
    pub unlocked: bool,
    pub share_token: Option<String>,
    pub invite_token: Option<String>,
    /// Accounts with collaboration rights. Duplicate-free, order preserved.
    pub collaborators: Vec<AccountId>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// Fields accepted when creating a capsule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCapsule {
    pub title: String,
    pub content: String,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub author_id: Option<AccountId>,
    #[serde(default)]
    pub collaborators: Vec<AccountId>,
}

/// List-view shape. Carries no content or audio fields at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleSummary {
    pub id: CapsuleId,
    pub owner_id: AccountId,
    pub title: String,
    pub release_date: NaiveDate,
    pub unlocked: bool,
    pub collaborators: Vec<AccountId>,
    /// Calendar days until release. Present only while locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl CapsuleSummary {
    pub fn of(capsule: &Capsule, today: NaiveDate) -> Self {
        Self {
            id: capsule.id,
            owner_id: capsule.owner_id,
            title: capsule.title.clone(),
            release_date: capsule.release_date,
            unlocked: capsule.unlocked,
            collaborators: capsule.collaborators.clone(),
            days_remaining: if capsule.unlocked {
                None
            } else {
                Some(time::days_until(capsule.release_date, today))
            },
            created_at: capsule.created_at,
            updated_at: capsule.updated_at,
        }
    }
}

/// Detail-view shape. Content and audio appear only once unlocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleDetail {
    pub id: CapsuleId,
    pub owner_id: AccountId,
    pub author_id: Option<AccountId>,
    pub title: String,
    pub release_date: NaiveDate,
    pub unlocked: bool,
    pub collaborators: Vec<AccountId>,
    /// Calendar days until release. Present only while locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_ref: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl CapsuleDetail {
    pub fn of(capsule: &Capsule, today: NaiveDate) -> Self {
        let (content, audio_ref, days_remaining) = if capsule.unlocked {
            (Some(capsule.content.clone()), capsule.audio_ref.clone(), None)
        } else {
            (
                None,
                None,
                Some(time::days_until(capsule.release_date, today)),
            )
        };
        Self {
            id: capsule.id,
            owner_id: capsule.owner_id,
            author_id: capsule.author_id,
            title: capsule.title.clone(),
            release_date: capsule.release_date,
            unlocked: capsule.unlocked,
            collaborators: capsule.collaborators.clone(),
            days_remaining,
            content,
            audio_ref,
            created_at: capsule.created_at,
            updated_at: capsule.updated_at,
        }
    }
}

/// What a share-link holder sees: the capsule detail plus who wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedCapsuleView {
    /// Display name of the author account. `None` once that account is gone.
    pub author_name: Option<String>,
    pub capsule: CapsuleDetail,
}

/// Mutation applied to a capsule's collaborator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorAction {
    Add,
    Remove,
}

/// Rejected collaborator action string.
#[derive(Debug, thiserror::Error)]
#[error("unknown collaborator action: {0}")]
pub struct UnknownAction(pub String);

impl std::str::FromStr for CollaboratorAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}
