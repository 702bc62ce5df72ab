//! The match coordinator.
//!
//! Each `(room, item)` pair is either unmatched or matched. Only two paths
//! move between the states:
//!
//! - [`MatchCoordinator::evaluate_for_match`], run after every LIKE, creates
//!   the match once both members like the item. The existence check is done
//!   twice: once cheaply outside any transaction, and again inside the
//!   store's atomic create step. Two partners liking the same item at the
//!   same instant therefore produce one winner and one no-op.
//! - [`MatchCoordinator::undo_last_decision`] deletes the match when the
//!   undone verdict was a LIKE, in the same store transaction that removes
//!   the decision.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  decision::{Decision, ItemId, Verdict},
  matches::{Evaluation, MatchCreation, MatchEvent, PurgeReport, UndoOutcome},
  notify::Notifier,
  room::UserId,
  store::SwipeStore,
};

/// Number of likes that turns an item into a match.
const LIKES_FOR_MATCH: usize = 2;

/// Ties the decision log, match records and notification dispatch together.
pub struct MatchCoordinator<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
}

impl<S, N> Clone for MatchCoordinator<S, N> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), notifier: Arc::clone(&self.notifier) }
  }
}

impl<S: SwipeStore, N: Notifier> MatchCoordinator<S, N> {
  pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self { Self { store, notifier } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Record a decision and, for a LIKE, evaluate the item straight away.
  ///
  /// The durable pending evaluation written with the LIKE is acknowledged
  /// only after evaluation succeeds, so a failure here is retried later by
  /// [`Self::drain_pending`].
  pub async fn record_decision(
    &self,
    room_id: Uuid,
    user: UserId,
    item_id: ItemId,
    verdict: Verdict,
  ) -> Result<(Decision, Option<Evaluation>), S::Error> {
    self
      .record_decision_at(Decision::new(room_id, user, item_id, verdict, Utc::now()))
      .await
  }

  /// [`Self::record_decision`] with a caller-assigned timestamp.
  pub async fn record_decision_at(
    &self,
    decision: Decision,
  ) -> Result<(Decision, Option<Evaluation>), S::Error> {
    let recorded = self.store.record_decision(decision).await?;
    let decision = recorded.decision;
    debug!(
      room_id = %decision.room_id,
      item_id = decision.item_id,
      user = %decision.user_id,
      verdict = %decision.verdict,
      "decision recorded"
    );

    let Some(evaluation_id) = recorded.evaluation else {
      return Ok((decision, None));
    };

    let evaluation = self.evaluate_for_match(decision.room_id, decision.item_id).await?;
    self.store.ack_evaluation(evaluation_id).await?;
    Ok((decision, Some(evaluation)))
  }

  /// Create the match for `(room_id, item_id)` if both members like it.
  ///
  /// Idempotent: running it again, or concurrently, never creates a second
  /// match and never notifies twice.
  pub async fn evaluate_for_match(
    &self,
    room_id: Uuid,
    item_id: ItemId,
  ) -> Result<Evaluation, S::Error> {
    // Advisory; the authoritative check happens inside the transaction.
    if self.store.get_match(room_id, item_id).await?.is_some() {
      return Ok(Evaluation::AlreadyMatched);
    }

    let likes = self
      .store
      .decisions_for_item(room_id, item_id)
      .await?
      .iter()
      .filter(|d| d.verdict.is_like())
      .count();
    if likes < LIKES_FOR_MATCH {
      return Ok(Evaluation::NotEnoughLikes);
    }

    match self.store.create_match_if_absent(room_id, item_id, Utc::now()).await? {
      MatchCreation::Created { record, members } => {
        info!(%room_id, item_id, "match created");
        let event = MatchEvent { room_id, item_id, recipients: members };
        if let Err(e) = self.notifier.notify(&event).await {
          warn!(%room_id, item_id, error = %e, "match notification failed");
        }
        Ok(Evaluation::Created(record))
      }
      MatchCreation::AlreadyMatched => {
        debug!(%room_id, item_id, "lost match creation race");
        Ok(Evaluation::AlreadyMatched)
      }
      MatchCreation::NotEnoughLikes => {
        debug!(%room_id, item_id, "like withdrawn before match creation");
        Ok(Evaluation::NotEnoughLikes)
      }
    }
  }

  /// Undo the user's most recent decision and roll back a match it caused.
  pub async fn undo_last_decision(
    &self,
    room_id: Uuid,
    user: &UserId,
  ) -> Result<UndoOutcome, S::Error> {
    let outcome = self.store.undo_last_decision(room_id, user).await?;
    if let Some(undone) = &outcome.undone {
      debug!(%room_id, %user, item_id = undone.item_id, "decision undone");
      if outcome.match_removed {
        info!(%room_id, item_id = undone.item_id, "match rolled back by undo");
      }
    }
    Ok(outcome)
  }

  /// Re-run evaluations whose synchronous follow-up never completed.
  ///
  /// Returns the number of evaluations processed. An evaluation that fails
  /// stays queued for the next pass.
  pub async fn drain_pending(&self, limit: usize) -> Result<usize, S::Error> {
    let pending = self.store.pending_evaluations(limit).await?;
    let mut processed = 0;
    for entry in pending {
      match self.evaluate_for_match(entry.room_id, entry.item_id).await {
        Ok(_) => {
          self.store.ack_evaluation(entry.evaluation_id).await?;
          processed += 1;
        }
        Err(e) => warn!(
          evaluation_id = entry.evaluation_id,
          room_id = %entry.room_id,
          item_id = entry.item_id,
          error = %e,
          "pending evaluation failed"
        ),
      }
    }
    Ok(processed)
  }

  /// Delete every decision `user` made in the room and drop the matches that
  /// are left without two likes.
  pub async fn forget_user_decisions(
    &self,
    room_id: Uuid,
    user: &UserId,
  ) -> Result<PurgeReport, S::Error> {
    let report = self.store.delete_user_decisions(room_id, user).await?;
    info!(
      %room_id,
      %user,
      decisions = report.decisions,
      matches = report.matches,
      "user decisions deleted"
    );
    Ok(report)
  }
}
