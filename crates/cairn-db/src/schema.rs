//! SQL schema definitions.

/// Complete schema for the Cairn v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Accounts
-- ============================================================

CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    display_name TEXT NOT NULL,
    access_token TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_access_token ON accounts(access_token);

-- ============================================================
-- Capsules
-- ============================================================

CREATE TABLE IF NOT EXISTS capsules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    author_id INTEGER,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    audio_ref TEXT,
    release_date TEXT NOT NULL,
    unlocked INTEGER NOT NULL DEFAULT 0,
    share_token TEXT,
    invite_token TEXT,
    collaborators TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_capsules_owner ON capsules(owner_id);
CREATE INDEX IF NOT EXISTS idx_capsules_release ON capsules(release_date);
CREATE INDEX IF NOT EXISTS idx_capsules_locked ON capsules(unlocked) WHERE unlocked = 0;
CREATE UNIQUE INDEX IF NOT EXISTS idx_capsules_share_token ON capsules(share_token);
CREATE UNIQUE INDEX IF NOT EXISTS idx_capsules_invite_token ON capsules(invite_token);
"#;
