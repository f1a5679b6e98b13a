//! Capsule query functions.
//!
//! All mutators stamp `updated_at`; the bulk unlock statement is a single
//! atomic UPDATE so a sweep is never observable half-applied.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rusqlite::Connection;

use cairn_types::{capsule::Capsule, AccountId, CapsuleId};

use crate::queries::{fmt_date, fmt_ts, map_conflict, parse_date, parse_ts};
use crate::{collab, DbError, Result};

/// Fields for inserting a capsule row.
#[derive(Debug)]
pub struct NewCapsuleRow<'a> {
    pub owner_id: AccountId,
    pub author_id: Option<AccountId>,
    pub title: &'a str,
    pub content: &'a str,
    pub audio_ref: Option<&'a str>,
    pub release_date: NaiveDate,
    pub unlocked: bool,
    pub collaborators: &'a [AccountId],
    pub now: DateTime<FixedOffset>,
}

/// Insert a new capsule and return its store-assigned id.
pub fn insert(conn: &Connection, new: &NewCapsuleRow<'_>) -> Result<CapsuleId> {
    let collaborators = collab::encode(new.collaborators)?;
    conn.execute(
        "INSERT INTO capsules (owner_id, author_id, title, content, audio_ref, release_date,
                               unlocked, collaborators, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        rusqlite::params![
            new.owner_id,
            new.author_id,
            new.title,
            new.content,
            new.audio_ref,
            fmt_date(new.release_date),
            new.unlocked,
            collaborators,
            fmt_ts(new.now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a capsule by id.
pub fn get(conn: &Connection, id: CapsuleId) -> Result<Capsule> {
    let raw = conn
        .query_row(
            "SELECT id, owner_id, author_id, title, content, audio_ref, release_date,
                    unlocked, share_token, invite_token, collaborators, created_at, updated_at
             FROM capsules WHERE id = ?1",
            rusqlite::params![id],
            read_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("capsule".into()),
            other => DbError::Sqlite(other),
        })?;
    into_capsule(raw)
}

/// List all capsules owned by an account.
pub fn list_by_owner(conn: &Connection, owner_id: AccountId) -> Result<Vec<Capsule>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner_id, author_id, title, content, audio_ref, release_date,
                unlocked, share_token, invite_token, collaborators, created_at, updated_at
         FROM capsules WHERE owner_id = ?1 ORDER BY id",
    )?;

    let raws = stmt
        .query_map(rusqlite::params![owner_id], read_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raws.into_iter().map(into_capsule).collect()
}

/// Flip every locked capsule whose release date has arrived. Returns the
/// number of rows transitioned. Running it again is a no-op.
pub fn mark_unlocked_due(
    conn: &Connection,
    today: NaiveDate,
    now: DateTime<FixedOffset>,
) -> Result<usize> {
    let affected = conn.execute(
        "UPDATE capsules SET unlocked = 1, updated_at = ?2
         WHERE release_date <= ?1 AND unlocked = 0",
        rusqlite::params![fmt_date(today), fmt_ts(now)],
    )?;
    Ok(affected)
}

/// Assign a capsule's share token, replacing any previous one.
pub fn set_share_token(
    conn: &Connection,
    id: CapsuleId,
    token: &str,
    now: DateTime<FixedOffset>,
) -> Result<()> {
    let affected = conn
        .execute(
            "UPDATE capsules SET share_token = ?2, updated_at = ?3 WHERE id = ?1",
            rusqlite::params![id, token, fmt_ts(now)],
        )
        .map_err(|e| map_conflict(e, "share token already in use"))?;
    if affected == 0 {
        return Err(DbError::NotFound("capsule".into()));
    }
    Ok(())
}

/// Resolve a share token to its capsule.
pub fn find_by_share_token(conn: &Connection, token: &str) -> Result<Capsule> {
    let raw = conn
        .query_row(
            "SELECT id, owner_id, author_id, title, content, audio_ref, release_date,
                    unlocked, share_token, invite_token, collaborators, created_at, updated_at
             FROM capsules WHERE share_token = ?1",
            rusqlite::params![token],
            read_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("share token".into()),
            other => DbError::Sqlite(other),
        })?;
    into_capsule(raw)
}

/// Assign a capsule's invite token, replacing any previous one.
pub fn set_invite_token(
    conn: &Connection,
    id: CapsuleId,
    token: &str,
    now: DateTime<FixedOffset>,
) -> Result<()> {
    let affected = conn
        .execute(
            "UPDATE capsules SET invite_token = ?2, updated_at = ?3 WHERE id = ?1",
            rusqlite::params![id, token, fmt_ts(now)],
        )
        .map_err(|e| map_conflict(e, "invite token already in use"))?;
    if affected == 0 {
        return Err(DbError::NotFound("capsule".into()));
    }
    Ok(())
}

/// Resolve an invite token to its capsule.
pub fn find_by_invite_token(conn: &Connection, token: &str) -> Result<Capsule> {
    let raw = conn
        .query_row(
            "SELECT id, owner_id, author_id, title, content, audio_ref, release_date,
                    unlocked, share_token, invite_token, collaborators, created_at, updated_at
             FROM capsules WHERE invite_token = ?1",
            rusqlite::params![token],
            read_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("invite token".into()),
            other => DbError::Sqlite(other),
        })?;
    into_capsule(raw)
}

/// Set the cached audio reference, but only if none has been persisted yet.
/// Returns whether this call's value landed.
pub fn set_audio_ref_if_absent(
    conn: &Connection,
    id: CapsuleId,
    url: &str,
    now: DateTime<FixedOffset>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE capsules SET audio_ref = ?2, updated_at = ?3
         WHERE id = ?1 AND audio_ref IS NULL",
        rusqlite::params![id, url, fmt_ts(now)],
    )?;
    Ok(affected == 1)
}

/// Replace a capsule's collaborator list.
pub fn set_collaborators(
    conn: &Connection,
    id: CapsuleId,
    collaborators: &[AccountId],
    now: DateTime<FixedOffset>,
) -> Result<()> {
    let encoded = collab::encode(collaborators)?;
    let affected = conn.execute(
        "UPDATE capsules SET collaborators = ?2, updated_at = ?3 WHERE id = ?1",
        rusqlite::params![id, encoded, fmt_ts(now)],
    )?;
    if affected == 0 {
        return Err(DbError::NotFound("capsule".into()));
    }
    Ok(())
}

/// Delete a capsule.
pub fn delete(conn: &Connection, id: CapsuleId) -> Result<()> {
    let affected = conn.execute("DELETE FROM capsules WHERE id = ?1", rusqlite::params![id])?;
    if affected == 0 {
        return Err(DbError::NotFound("capsule".into()));
    }
    Ok(())
}

/// A capsule row as read, before text columns are decoded.
struct RawCapsule {
    id: i64,
    owner_id: i64,
    author_id: Option<i64>,
    title: String,
    content: String,
    audio_ref: Option<String>,
    release_date: String,
    unlocked: bool,
    share_token: Option<String>,
    invite_token: Option<String>,
    collaborators: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> std::result::Result<RawCapsule, rusqlite::Error> {
    Ok(RawCapsule {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        author_id: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        audio_ref: row.get(5)?,
        release_date: row.get(6)?,
        unlocked: row.get(7)?,
        share_token: row.get(8)?,
        invite_token: row.get(9)?,
        collaborators: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn into_capsule(raw: RawCapsule) -> Result<Capsule> {
    Ok(Capsule {
        id: raw.id,
        owner_id: raw.owner_id,
        author_id: raw.author_id,
        title: raw.title,
        content: raw.content,
        audio_ref: raw.audio_ref,
        release_date: parse_date(&raw.release_date)?,
        unlocked: raw.unlocked,
        share_token: raw.share_token,
        invite_token: raw.invite_token,
        collaborators: collab::decode(&raw.collaborators)?,
        created_at: parse_ts(&raw.created_at)?,
        updated_at: parse_ts(&raw.updated_at)?,
    })
}
