//! Decisions: one user's verdict on one item inside a room.
//!
//! The log keeps at most one decision per `(room, item, user)`; writing the
//! same key again overwrites the earlier verdict.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::room::UserId;

/// Catalog identifier of a candidate item (a movie id).
pub type ItemId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
  Like,
  Pass,
}

impl Verdict {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Like => "like",
      Self::Pass => "pass",
    }
  }

  pub fn is_like(self) -> bool { self == Self::Like }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Verdict {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "like" => Ok(Self::Like),
      "pass" => Ok(Self::Pass),
      other => Err(format!("unknown verdict: {other:?}")),
    }
  }
}

/// A stored decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  pub room_id:    Uuid,
  pub item_id:    ItemId,
  pub user_id:    UserId,
  pub verdict:    Verdict,
  /// Caller-assigned submission time; undo removes the latest one.
  pub decided_at: DateTime<Utc>,
}

impl Decision {
  pub fn new(
    room_id: Uuid,
    user_id: UserId,
    item_id: ItemId,
    verdict: Verdict,
    decided_at: DateTime<Utc>,
  ) -> Self {
    Self { room_id, item_id, user_id, verdict, decided_at }
  }
}

/// What `record_decision` hands back.
#[derive(Debug, Clone)]
pub struct RecordedDecision {
  pub decision:   Decision,
  /// Id of the durable pending-evaluation entry written alongside a LIKE.
  /// Always `None` for a PASS.
  pub evaluation: Option<i64>,
}

/// A LIKE whose match evaluation has not been acknowledged yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvaluation {
  pub evaluation_id: i64,
  pub room_id:       Uuid,
  pub item_id:       ItemId,
  pub enqueued_at:   DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verdict_string_forms_agree_with_serde() {
    for v in [Verdict::Like, Verdict::Pass] {
      let json = serde_json::to_string(&v).unwrap();
      assert_eq!(json, format!("\"{}\"", v.as_str()));
      assert_eq!(v.as_str().parse::<Verdict>().unwrap(), v);
    }
    assert!("maybe".parse::<Verdict>().is_err());
  }
}
