//! The `SwipeStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `duet-store-sqlite`).
//! The [`MatchCoordinator`](crate::coordinator::MatchCoordinator) and the HTTP
//! layer depend on this abstraction, not on any concrete backend.
//!
//! Two operations carry the concurrency guarantees of the system and must be
//! a single atomic read-check-write in every backend:
//! [`SwipeStore::join_room`] and [`SwipeStore::create_match_if_absent`].

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  decision::{Decision, ItemId, PendingEvaluation, RecordedDecision},
  error::StoreError,
  feed::DecisionSubscription,
  matches::{Match, MatchCreation, PurgeReport, UndoOutcome},
  room::{CreatedRoom, InviteCode, Room, UserId},
};

/// Abstraction over a duet storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SwipeStore: Send + Sync {
  type Error: StoreError;

  // ── Room directory ────────────────────────────────────────────────────

  /// Atomically create a room containing `user`, a fresh invite code for it,
  /// and the user → room association. Retries code generation on collision
  /// up to [`INVITE_CODE_ATTEMPTS`](crate::room::INVITE_CODE_ATTEMPTS) times.
  fn create_room(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<CreatedRoom, Self::Error>> + Send + '_;

  /// Atomically add `user` to the room behind `code`.
  ///
  /// Fails, in priority order, with `InviteCodeNotFound`,
  /// `RoomNoLongerExists`, `AlreadyMember` or `RoomFull`.
  fn join_room<'a>(
    &'a self,
    user: UserId,
    code: &'a InviteCode,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + 'a;

  /// Retrieve a room. Returns `None` if it does not exist.
  fn get_room(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + '_;

  /// The room `user` is currently associated with, if any.
  fn room_for_user<'a>(
    &'a self,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Option<Uuid>, Self::Error>> + Send + 'a;

  /// Remove `user` from the room, deleting the room once it is empty. The
  /// user's room association is always cleared.
  fn leave_room(
    &self,
    user: UserId,
    room_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Decision log ──────────────────────────────────────────────────────

  /// Upsert a decision keyed by `(room, item, user)`. A LIKE also enqueues a
  /// durable pending evaluation in the same transaction.
  fn record_decision(
    &self,
    decision: Decision,
  ) -> impl Future<Output = Result<RecordedDecision, Self::Error>> + Send + '_;

  /// All decisions recorded for one item in a room.
  fn decisions_for_item(
    &self,
    room_id: Uuid,
    item_id: ItemId,
  ) -> impl Future<Output = Result<Vec<Decision>, Self::Error>> + Send + '_;

  /// All decisions recorded by one user in a room, oldest first.
  fn decisions_for_user<'a>(
    &'a self,
    room_id: Uuid,
    user: &'a UserId,
  ) -> impl Future<Output = Result<Vec<Decision>, Self::Error>> + Send + 'a;

  /// Delete the user's decision with the latest timestamp and, if it was a
  /// LIKE, the match on its item. Both deletes commit together or not at all.
  fn undo_last_decision<'a>(
    &'a self,
    room_id: Uuid,
    user: &'a UserId,
  ) -> impl Future<Output = Result<UndoOutcome, Self::Error>> + Send + 'a;

  /// Subscribe to decisions newly written by `partner` in `room_id`.
  fn subscribe_decisions(&self, room_id: Uuid, partner: UserId) -> DecisionSubscription;

  // ── Matches ───────────────────────────────────────────────────────────

  fn get_match(
    &self,
    room_id: Uuid,
    item_id: ItemId,
  ) -> impl Future<Output = Result<Option<Match>, Self::Error>> + Send + '_;

  /// All matches in a room, newest first.
  fn list_matches(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Match>, Self::Error>> + Send + '_;

  /// In one atomic transaction: re-check that no match exists, re-count the
  /// likes, write the match stamped `now`, and read the room membership.
  fn create_match_if_absent(
    &self,
    room_id: Uuid,
    item_id: ItemId,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<MatchCreation, Self::Error>> + Send + '_;

  /// Delete a match. Returns whether one existed.
  fn delete_match(
    &self,
    room_id: Uuid,
    item_id: ItemId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Set the watched flag and notes. Fails with `MatchNotFound`.
  fn mark_watched(
    &self,
    room_id: Uuid,
    item_id: ItemId,
    notes: String,
  ) -> impl Future<Output = Result<Match, Self::Error>> + Send + '_;

  // ── Pending evaluations ───────────────────────────────────────────────

  /// Oldest unacknowledged evaluations, at most `limit`.
  fn pending_evaluations(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<PendingEvaluation>, Self::Error>> + Send + '_;

  /// Mark an evaluation as done. Acknowledging twice is harmless.
  fn ack_evaluation(
    &self,
    evaluation_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Retention ─────────────────────────────────────────────────────────

  /// Delete decisions and matches created before `cutoff`, keeping matches
  /// that are watched and carry notes.
  fn purge_expired(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<PurgeReport, Self::Error>> + Send + '_;

  /// Delete every decision `user` made in the room, then delete each match
  /// that no longer has two live likes (keeping watched + noted matches).
  fn delete_user_decisions<'a>(
    &'a self,
    room_id: Uuid,
    user: &'a UserId,
  ) -> impl Future<Output = Result<PurgeReport, Self::Error>> + Send + 'a;
}
