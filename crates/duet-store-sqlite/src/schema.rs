//! SQL schema for the duet SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are INTEGER nanoseconds since the Unix epoch so that undo's
/// "most recent" query orders numerically.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS rooms (
    room_id     TEXT PRIMARY KEY,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS room_members (
    room_id     TEXT NOT NULL REFERENCES rooms(room_id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL,
    joined_at   INTEGER NOT NULL,
    PRIMARY KEY (room_id, user_id)
);

-- Codes outlive their rooms so a stale code reports the room as gone.
CREATE TABLE IF NOT EXISTS invite_codes (
    code        TEXT PRIMARY KEY,
    room_id     TEXT NOT NULL UNIQUE,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS user_rooms (
    user_id     TEXT PRIMARY KEY,
    room_id     TEXT NOT NULL
);

-- One row per (room, item, user); rewrites overwrite in place.
CREATE TABLE IF NOT EXISTS decisions (
    room_id     TEXT    NOT NULL,
    item_id     INTEGER NOT NULL,
    user_id     TEXT    NOT NULL,
    verdict     TEXT    NOT NULL CHECK (verdict IN ('like', 'pass')),
    decided_at  INTEGER NOT NULL,
    seq         INTEGER NOT NULL,   -- write order; breaks decided_at ties
    PRIMARY KEY (room_id, item_id, user_id)
);

CREATE TABLE IF NOT EXISTS matches (
    room_id     TEXT    NOT NULL,
    item_id     INTEGER NOT NULL,
    created_at  INTEGER NOT NULL,
    watched     INTEGER NOT NULL DEFAULT 0,
    notes       TEXT    NOT NULL DEFAULT '',
    PRIMARY KEY (room_id, item_id)
);

-- Durable record of LIKEs whose match evaluation is not acknowledged yet.
CREATE TABLE IF NOT EXISTS pending_evaluations (
    evaluation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id       TEXT    NOT NULL,
    item_id       INTEGER NOT NULL,
    enqueued_at   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS decisions_user_idx    ON decisions(room_id, user_id, decided_at);
CREATE INDEX IF NOT EXISTS decisions_decided_idx ON decisions(decided_at);
CREATE INDEX IF NOT EXISTS decisions_seq_idx     ON decisions(seq);
CREATE INDEX IF NOT EXISTS matches_created_idx   ON matches(created_at);

PRAGMA user_version = 2;
";
