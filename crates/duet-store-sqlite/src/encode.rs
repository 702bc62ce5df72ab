//! Encoding and decoding helpers between duet domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as INTEGER nanoseconds since the Unix epoch, which
//! covers 1677 through 2262. UUIDs are stored as hyphenated lowercase
//! strings. Verdicts are `like` / `pass`.

use chrono::{DateTime, Utc};
use duet_core::{
  decision::{Decision, PendingEvaluation, Verdict},
  matches::Match,
  room::{Room, UserId},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ──────────────────────────────────────────────────────────

pub fn encode_ts(dt: DateTime<Utc>) -> Result<i64> {
  dt.timestamp_nanos_opt().ok_or(Error::Timestamp(dt))
}

pub fn decode_ts(nanos: i64) -> DateTime<Utc> { DateTime::from_timestamp_nanos(nanos) }

// ─── Verdict ────────────────────────────────────────────────────────────────

pub fn decode_verdict(s: &str) -> Result<Verdict> { s.parse().map_err(Error::Decode) }

// ─── UserId ─────────────────────────────────────────────────────────────────

pub fn decode_user(s: String) -> Result<UserId> {
  UserId::new(s).map_err(|e| Error::Decode(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `rooms` row plus its `room_members`.
pub struct RawRoom {
  pub room_id:    String,
  pub created_at: i64,
  pub members:    Vec<String>,
}

impl RawRoom {
  pub fn into_room(self) -> Result<Room> {
    Ok(Room {
      room_id:    decode_uuid(&self.room_id)?,
      members:    self.members.into_iter().map(decode_user).collect::<Result<_>>()?,
      created_at: decode_ts(self.created_at),
    })
  }
}

/// Raw values read from a `decisions` row.
pub struct RawDecision {
  pub room_id:    String,
  pub item_id:    i64,
  pub user_id:    String,
  pub verdict:    String,
  pub decided_at: i64,
}

impl RawDecision {
  pub const COLUMNS: &'static str = "room_id, item_id, user_id, verdict, decided_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      room_id:    row.get(0)?,
      item_id:    row.get(1)?,
      user_id:    row.get(2)?,
      verdict:    row.get(3)?,
      decided_at: row.get(4)?,
    })
  }

  pub fn into_decision(self) -> Result<Decision> {
    Ok(Decision {
      room_id:    decode_uuid(&self.room_id)?,
      item_id:    self.item_id,
      user_id:    decode_user(self.user_id)?,
      verdict:    decode_verdict(&self.verdict)?,
      decided_at: decode_ts(self.decided_at),
    })
  }
}

/// Raw values read from a `matches` row.
pub struct RawMatch {
  pub room_id:    String,
  pub item_id:    i64,
  pub created_at: i64,
  pub watched:    bool,
  pub notes:      String,
}

impl RawMatch {
  pub const COLUMNS: &'static str = "room_id, item_id, created_at, watched, notes";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      room_id:    row.get(0)?,
      item_id:    row.get(1)?,
      created_at: row.get(2)?,
      watched:    row.get(3)?,
      notes:      row.get(4)?,
    })
  }

  pub fn into_match(self) -> Result<Match> {
    Ok(Match {
      room_id:    decode_uuid(&self.room_id)?,
      item_id:    self.item_id,
      created_at: decode_ts(self.created_at),
      watched:    self.watched,
      notes:      self.notes,
    })
  }
}

/// Raw values read from a `pending_evaluations` row.
pub struct RawPending {
  pub evaluation_id: i64,
  pub room_id:       String,
  pub item_id:       i64,
  pub enqueued_at:   i64,
}

impl RawPending {
  pub fn into_pending(self) -> Result<PendingEvaluation> {
    Ok(PendingEvaluation {
      evaluation_id: self.evaluation_id,
      room_id:       decode_uuid(&self.room_id)?,
      item_id:       self.item_id,
      enqueued_at:   decode_ts(self.enqueued_at),
    })
  }
}
