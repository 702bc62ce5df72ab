//! Matches and the outcomes of the operations that create or remove them.
//!
//! A match is the durable record that both room members liked the same item.
//! It exists at most once per `(room, item)` and is only removed by an undo
//! rollback, an explicit decision purge, or retention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  decision::{Decision, ItemId},
  room::UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
  pub room_id:    Uuid,
  pub item_id:    ItemId,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub watched:    bool,
  #[serde(default)]
  pub notes:      String,
}

impl Match {
  pub fn new(room_id: Uuid, item_id: ItemId, created_at: DateTime<Utc>) -> Self {
    Self { room_id, item_id, created_at, watched: false, notes: String::new() }
  }

  /// Watched matches with notes are kept forever by retention.
  pub fn is_retained(&self) -> bool { self.watched && !self.notes.trim().is_empty() }
}

/// Payload handed to the notification dispatcher when a match is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
  pub room_id:    Uuid,
  pub item_id:    ItemId,
  pub recipients: Vec<UserId>,
}

/// Result of the transactional create step.
#[derive(Debug, Clone)]
pub enum MatchCreation {
  /// This call wrote the match. `members` is the room membership read in the
  /// same transaction.
  Created { record: Match, members: Vec<UserId> },
  /// A match already existed; nothing was written.
  AlreadyMatched,
  /// Fewer than two likes were present inside the transaction.
  NotEnoughLikes,
}

/// What `evaluate_for_match` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
  Created(Match),
  AlreadyMatched,
  NotEnoughLikes,
}

impl Evaluation {
  pub fn created(&self) -> Option<&Match> {
    match self {
      Self::Created(m) => Some(m),
      _ => None,
    }
  }
}

/// What `undo_last_decision` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoOutcome {
  /// The removed decision, `None` if the user had nothing to undo.
  pub undone:        Option<Decision>,
  /// Whether the undo rolled back a match.
  pub match_removed: bool,
}

/// Counts of rows removed by a retention or purge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
  pub decisions: usize,
  pub matches:   usize,
}
