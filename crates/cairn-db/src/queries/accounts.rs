//! Account query functions.
//!
//! The access token column is the opaque credential the daemon resolves
//! callers with; it never leaves this module inside an [`Account`].

use chrono::{DateTime, FixedOffset};
use rusqlite::Connection;

use cairn_types::{account::Account, AccountId};

use crate::queries::{fmt_ts, map_conflict, parse_ts};
use crate::{DbError, Result};

/// Insert a new account and return its store-assigned id.
pub fn insert(
    conn: &Connection,
    display_name: &str,
    access_token: &str,
    now: DateTime<FixedOffset>,
) -> Result<AccountId> {
    conn.execute(
        "INSERT INTO accounts (display_name, access_token, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![display_name, access_token, fmt_ts(now)],
    )
    .map_err(|e| map_conflict(e, "access token already in use"))?;
    Ok(conn.last_insert_rowid())
}

/// Get an account by id.
pub fn get(conn: &Connection, id: AccountId) -> Result<Account> {
    let raw = conn
        .query_row(
            "SELECT id, display_name, created_at, updated_at FROM accounts WHERE id = ?1",
            rusqlite::params![id],
            read_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("account".into()),
            other => DbError::Sqlite(other),
        })?;
    into_account(raw)
}

/// Resolve an access token to its account.
pub fn find_by_access_token(conn: &Connection, access_token: &str) -> Result<Account> {
    let raw = conn
        .query_row(
            "SELECT id, display_name, created_at, updated_at
             FROM accounts WHERE access_token = ?1",
            rusqlite::params![access_token],
            read_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("account".into()),
            other => DbError::Sqlite(other),
        })?;
    into_account(raw)
}

/// Fetch an account's display name, `None` if the account no longer exists.
pub fn display_name(conn: &Connection, id: AccountId) -> Result<Option<String>> {
    match conn.query_row(
        "SELECT display_name FROM accounts WHERE id = ?1",
        rusqlite::params![id],
        |row| row.get::<_, String>(0),
    ) {
        Ok(name) => Ok(Some(name)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(other) => Err(DbError::Sqlite(other)),
    }
}

/// Delete an account.
pub fn delete(conn: &Connection, id: AccountId) -> Result<()> {
    let affected = conn.execute("DELETE FROM accounts WHERE id = ?1", rusqlite::params![id])?;
    if affected == 0 {
        return Err(DbError::NotFound("account".into()));
    }
    Ok(())
}

struct RawAccount {
    id: i64,
    display_name: String,
    created_at: String,
    updated_at: String,
}

fn read_row(row: &rusqlite::Row<'_>) -> std::result::Result<RawAccount, rusqlite::Error> {
    Ok(RawAccount {
        id: row.get(0)?,
        display_name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn into_account(raw: RawAccount) -> Result<Account> {
    Ok(Account {
        id: raw.id,
        display_name: raw.display_name,
        created_at: parse_ts(&raw.created_at)?,
        updated_at: parse_ts(&raw.updated_at)?,
    })
}
