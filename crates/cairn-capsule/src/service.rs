//! Capsule operations.
//!
//! One service owns the shared store handle and the render collaborators.
//! Disclosure is enforced by construction: every response goes through the
//! `CapsuleSummary` / `CapsuleDetail` constructors, which redact content and
//! audio for locked capsules, so no operation here can leak an embargoed
//! body whatever path it takes.

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use cairn_db::queries::accounts;
use cairn_db::queries::capsules::{self, NewCapsuleRow};
use cairn_db::DbError;
use cairn_render::RenderCache;
use cairn_types::capsule::{
    Capsule, CapsuleDetail, CapsuleSummary, CollaboratorAction, NewCapsule, SharedCapsuleView,
};
use cairn_types::{time, AccountId, CapsuleId, COPY_TITLE_PREFIX, TITLE_MAX_CHARS, TITLE_MIN_CHARS};

use crate::{guard, CapsuleError, Result};

/// The capsule domain service.
pub struct CapsuleService {
    db: Arc<Mutex<Connection>>,
    render: RenderCache,
}

impl CapsuleService {
    pub fn new(db: Arc<Mutex<Connection>>, render: RenderCache) -> Self {
        Self { db, render }
    }

    /// Create a capsule. The release date must be strictly after today; no
    /// audio is rendered at creation.
    pub async fn create(&self, owner_id: AccountId, new: NewCapsule) -> Result<CapsuleDetail> {
        let title_chars = new.title.chars().count();
        if title_chars < TITLE_MIN_CHARS || title_chars > TITLE_MAX_CHARS {
            return Err(CapsuleError::InvalidArgument(format!(
                "title must be {TITLE_MIN_CHARS}-{TITLE_MAX_CHARS} characters"
            )));
        }
        if new.content.is_empty() {
            return Err(CapsuleError::InvalidArgument(
                "content must not be empty".to_string(),
            ));
        }
        let today = time::today();
        if new.release_date <= today {
            return Err(CapsuleError::InvalidDate(
                "release date must be in the future".to_string(),
            ));
        }

        let author_id = new.author_id.unwrap_or(owner_id);
        let capsule = {
            let conn = self.db.lock().await;
            let id = capsules::insert(
                &conn,
                &NewCapsuleRow {
                    owner_id,
                    author_id: Some(author_id),
                    title: &new.title,
                    content: &new.content,
                    audio_ref: None,
                    release_date: new.release_date,
                    unlocked: false,
                    collaborators: &new.collaborators,
                    now: time::now(),
                },
            )?;
            capsules::get(&conn, id)?
        };
        Ok(CapsuleDetail::of(&capsule, today))
    }

    /// List the caller's capsules. Summaries never carry content or audio.
    pub async fn list(&self, owner_id: AccountId) -> Result<Vec<CapsuleSummary>> {
        let today = time::today();
        let rows = {
            let conn = self.db.lock().await;
            capsules::list_by_owner(&conn, owner_id)?
        };
        Ok(rows.iter().map(|c| CapsuleSummary::of(c, today)).collect())
    }

    /// Read one capsule as its owner.
    ///
    /// A missing capsule is `NotFound`; an existing capsule owned by someone
    /// else is `Forbidden`. For an unlocked capsule without cached audio this
    /// runs the render pipeline first, but a pipeline failure never fails the
    /// read: content is returned with no audio reference and the next read
    /// tries again.
    pub async fn get(&self, capsule_id: CapsuleId, requester_id: AccountId) -> Result<CapsuleDetail> {
        let capsule = {
            let conn = self.db.lock().await;
            lookup(&conn, capsule_id)?
        };
        guard::ensure_owner(&capsule, requester_id)?;

        let capsule = self.with_audio(capsule).await;
        Ok(CapsuleDetail::of(&capsule, time::today()))
    }

    /// Promote every locked capsule whose release date has arrived. Returns
    /// the number transitioned. The same statement the scheduler runs.
    pub async fn check_and_unlock(&self) -> Result<usize> {
        let conn = self.db.lock().await;
        Ok(capsules::mark_unlocked_due(&conn, time::today(), time::now())?)
    }

    /// Issue a fresh share token, replacing any previous one. The old token
    /// becomes a dead link; capsules already copied from it are untouched.
    pub async fn generate_share_token(
        &self,
        capsule_id: CapsuleId,
        requester_id: AccountId,
    ) -> Result<String> {
        let token = cairn_token::generate();
        let conn = self.db.lock().await;
        let capsule = lookup(&conn, capsule_id)?;
        guard::ensure_owner(&capsule, requester_id)?;
        capsules::set_share_token(&conn, capsule_id, &token, time::now())?;
        Ok(token)
    }

    /// Resolve a share token into the read-only view a link holder sees.
    /// Refused with `NotUnlocked` while the capsule is still embargoed.
    pub async fn view_by_share_token(&self, token: &str) -> Result<SharedCapsuleView> {
        let conn = self.db.lock().await;
        let capsule = capsules::find_by_share_token(&conn, token).map_err(map_token)?;
        if !capsule.unlocked {
            return Err(CapsuleError::NotUnlocked);
        }
        let author_id = capsule.author_id.unwrap_or(capsule.owner_id);
        let author_name = accounts::display_name(&conn, author_id)?;
        Ok(SharedCapsuleView {
            author_name,
            capsule: CapsuleDetail::of(&capsule, time::today()),
        })
    }

    /// Copy a shared, unlocked capsule into the caller's own collection.
    ///
    /// The copy is born unlocked with the source's content, release date and
    /// audio reference (the artifact is reused, never re-rendered), a marker
    /// prefix on the title, the source's author of record, and no tokens or
    /// collaborators of its own.
    pub async fn copy_shared_capsule(
        &self,
        token: &str,
        new_owner_id: AccountId,
    ) -> Result<CapsuleDetail> {
        let today = time::today();
        let conn = self.db.lock().await;
        let source = capsules::find_by_share_token(&conn, token).map_err(map_token)?;
        if !source.unlocked {
            return Err(CapsuleError::NotUnlocked);
        }

        let title = format!("{COPY_TITLE_PREFIX}{}", source.title);
        let id = capsules::insert(
            &conn,
            &NewCapsuleRow {
                owner_id: new_owner_id,
                author_id: source.author_id.or(Some(source.owner_id)),
                title: &title,
                content: &source.content,
                audio_ref: source.audio_ref.as_deref(),
                release_date: source.release_date,
                unlocked: true,
                collaborators: &[],
                now: time::now(),
            },
        )?;
        let copy = capsules::get(&conn, id)?;
        Ok(CapsuleDetail::of(&copy, today))
    }

    /// Add or remove a collaborator. Owner-only; adding a present member or
    /// removing an absent one is a no-op that touches nothing.
    pub async fn update_collaborators(
        &self,
        capsule_id: CapsuleId,
        requester_id: AccountId,
        action: &str,
        target_id: AccountId,
    ) -> Result<CapsuleDetail> {
        let action: CollaboratorAction = action
            .parse()
            .map_err(|e: cairn_types::capsule::UnknownAction| {
                CapsuleError::InvalidArgument(e.to_string())
            })?;

        let today = time::today();
        let conn = self.db.lock().await;
        let capsule = lookup(&conn, capsule_id)?;
        guard::ensure_owner(&capsule, requester_id)?;

        let mut collaborators = capsule.collaborators.clone();
        match action {
            CollaboratorAction::Add => {
                if !collaborators.contains(&target_id) {
                    collaborators.push(target_id);
                }
            }
            CollaboratorAction::Remove => collaborators.retain(|&id| id != target_id),
        }
        if collaborators != capsule.collaborators {
            capsules::set_collaborators(&conn, capsule_id, &collaborators, time::now())?;
        }

        let refreshed = capsules::get(&conn, capsule_id)?;
        Ok(CapsuleDetail::of(&refreshed, today))
    }

    /// Issue a fresh invite token, replacing any previous one. Collaborators
    /// who already joined keep their membership.
    pub async fn generate_invite_token(
        &self,
        capsule_id: CapsuleId,
        requester_id: AccountId,
    ) -> Result<String> {
        let token = cairn_token::generate();
        let conn = self.db.lock().await;
        let capsule = lookup(&conn, capsule_id)?;
        guard::ensure_owner(&capsule, requester_id)?;
        capsules::set_invite_token(&conn, capsule_id, &token, time::now())?;
        Ok(token)
    }

    /// Join a capsule's collaborators through an invite token. Works while
    /// the capsule is still locked; joining twice is a no-op.
    pub async fn accept_invite(&self, token: &str, joiner_id: AccountId) -> Result<CapsuleDetail> {
        let today = time::today();
        let conn = self.db.lock().await;
        let capsule = capsules::find_by_invite_token(&conn, token).map_err(map_token)?;

        if !capsule.collaborators.contains(&joiner_id) {
            let mut collaborators = capsule.collaborators.clone();
            collaborators.push(joiner_id);
            capsules::set_collaborators(&conn, capsule.id, &collaborators, time::now())?;
        }

        let refreshed = capsules::get(&conn, capsule.id)?;
        Ok(CapsuleDetail::of(&refreshed, today))
    }

    /// Delete every capsule an account owns; the cascade step of account
    /// removal. Each row is deleted individually: a failure is logged and
    /// skipped rather than aborting the rest, and the count of rows actually
    /// removed is returned.
    pub async fn delete_owned(&self, owner_id: AccountId) -> Result<usize> {
        let conn = self.db.lock().await;
        let rows = capsules::list_by_owner(&conn, owner_id)?;

        let mut deleted = 0usize;
        for capsule in &rows {
            match capsules::delete(&conn, capsule.id) {
                Ok(()) => deleted += 1,
                Err(e) => {
                    // Leaves an orphan behind; surfaced loudly, not swallowed.
                    tracing::error!(
                        "failed to delete capsule {} while removing account {owner_id}: {e}",
                        capsule.id
                    );
                }
            }
        }
        Ok(deleted)
    }

    async fn with_audio(&self, mut capsule: Capsule) -> Capsule {
        if capsule.unlocked && capsule.audio_ref.is_none() {
            capsule.audio_ref = self.render.ensure_audio(&self.db, &capsule).await;
        }
        capsule
    }
}

fn lookup(conn: &Connection, id: CapsuleId) -> Result<Capsule> {
    capsules::get(conn, id).map_err(|e| match e {
        DbError::NotFound(what) => CapsuleError::NotFound(what),
        other => CapsuleError::Store(other),
    })
}

/// Token lookups collapse "no such row" into `InvalidToken`; a dangling link
/// and a never-issued one are indistinguishable by design.
fn map_token(e: DbError) -> CapsuleError {
    match e {
        DbError::NotFound(_) => CapsuleError::InvalidToken,
        other => CapsuleError::Store(other),
    }
}
