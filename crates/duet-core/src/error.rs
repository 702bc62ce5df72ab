//! Error types for `duet-core`.
//!
//! Every variant is an expected outcome of normal (possibly concurrent)
//! operation rather than a bug. Storage backends wrap this enum in their own
//! error type and expose it again through [`StoreError::domain`].

use thiserror::Error;
use uuid::Uuid;

use crate::room::UserId;

#[derive(Debug, Error)]
pub enum Error {
  // ── Validation ───────────────────────────────────────────────────────────
  #[error("invite code {0:?} is not in the form ABC-DEF")]
  InvalidInviteCode(String),

  #[error("user id must not be empty")]
  EmptyUserId,

  // ── Not found ────────────────────────────────────────────────────────────
  #[error("no room uses invite code {0}")]
  InviteCodeNotFound(String),

  #[error("room {0} no longer exists")]
  RoomNoLongerExists(Uuid),

  #[error("room not found: {0}")]
  RoomNotFound(Uuid),

  #[error("no match for item {item_id} in room {room_id}")]
  MatchNotFound { room_id: Uuid, item_id: i64 },

  // ── Conflicts ────────────────────────────────────────────────────────────
  #[error("user {user} is already a member of room {room_id}")]
  AlreadyMember { room_id: Uuid, user: UserId },

  #[error("room {0} is already full")]
  RoomFull(Uuid),

  #[error("user {user} is not a member of room {room_id}")]
  NotAMember { room_id: Uuid, user: UserId },

  #[error("room {0} has no partner yet")]
  NoPartner(Uuid),

  #[error("could not generate a free invite code after {0} attempts")]
  InviteCodeExhausted(usize),

  // ── Boundary adapters ────────────────────────────────────────────────────
  #[error("invalid page token {0:?}")]
  InvalidPageToken(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Broad category of the outcome, used to choose a user-facing message.
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidInviteCode(_)
      | Self::EmptyUserId
      | Self::InvalidPageToken(_) => ErrorKind::Validation,
      Self::InviteCodeNotFound(_)
      | Self::RoomNoLongerExists(_)
      | Self::RoomNotFound(_)
      | Self::MatchNotFound { .. } => ErrorKind::NotFound,
      Self::AlreadyMember { .. }
      | Self::RoomFull(_)
      | Self::NoPartner(_)
      | Self::InviteCodeExhausted(_) => ErrorKind::Conflict,
      Self::NotAMember { .. } => ErrorKind::Forbidden,
      Self::Serialization(_) => ErrorKind::Infrastructure,
    }
  }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Conflict,
  Forbidden,
  Infrastructure,
}

/// Implemented by storage-backend error types so callers can recover the
/// domain outcome (if any) from an otherwise opaque backend failure.
pub trait StoreError: std::error::Error + From<Error> + Send + Sync + 'static {
  /// The domain outcome wrapped by this error, or `None` for storage and
  /// decoding failures.
  fn domain(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
