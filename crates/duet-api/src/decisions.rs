//! Handlers for swiping, undo, and the partner decision feed.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/rooms/{id}/decisions` | Body: `{"item_id":42,"verdict":"like"}` |
//! | `DELETE` | `/rooms/{id}/decisions` | Forget all of the caller's decisions |
//! | `POST`   | `/rooms/{id}/undo` | Undo the caller's most recent decision |
//! | `GET`    | `/rooms/{id}/partner/decisions` | Server-sent events, one per partner decision |

use std::convert::Infallible;

use axum::{
  Json,
  extract::{Path, State},
  response::sse::{Event, KeepAlive, Sse},
};
use duet_core::{
  StoreError,
  catalog::CandidateSource,
  decision::{Decision, ItemId, Verdict},
  matches::{Match, PurgeReport, UndoOutcome},
  notify::Notifier,
  store::SwipeStore,
};
use futures_util::{Stream, stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, JsonBody},
  identity::{CurrentUser, member_room},
};

// ─── Record ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
  pub item_id: ItemId,
  pub verdict: Verdict,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
  pub decision: Decision,
  /// The match this decision created, if any.
  pub matched:  Option<Match>,
}

/// `POST /rooms/{id}/decisions`
pub async fn record<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
  JsonBody(body): JsonBody<DecisionBody>,
) -> Result<Json<DecisionResponse>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  member_room(state.coordinator.store().as_ref(), room_id, &user).await?;
  let (decision, evaluation) = state
    .coordinator
    .record_decision(room_id, user, body.item_id, body.verdict)
    .await
    .map_err(ApiError::from_store)?;
  let matched = evaluation.as_ref().and_then(|e| e.created()).cloned();
  Ok(Json(DecisionResponse { decision, matched }))
}

// ─── Forget ───────────────────────────────────────────────────────────────────

/// `DELETE /rooms/{id}/decisions`
pub async fn forget<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
) -> Result<Json<PurgeReport>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  member_room(state.coordinator.store().as_ref(), room_id, &user).await?;
  let report = state
    .coordinator
    .forget_user_decisions(room_id, &user)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(report))
}

// ─── Undo ─────────────────────────────────────────────────────────────────────

/// `POST /rooms/{id}/undo`
pub async fn undo<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
) -> Result<Json<UndoOutcome>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  member_room(state.coordinator.store().as_ref(), room_id, &user).await?;
  let outcome = state
    .coordinator
    .undo_last_decision(room_id, &user)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(outcome))
}

// ─── Partner feed ─────────────────────────────────────────────────────────────

/// `GET /rooms/{id}/partner/decisions`
///
/// Streams decisions the partner writes after the request arrives. The
/// subscription is released when the client disconnects and the stream is
/// dropped.
pub async fn partner_feed<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let store = state.coordinator.store();
  let room = member_room(store.as_ref(), room_id, &user).await?;
  let partner = room
    .partner_of(&user)
    .cloned()
    .ok_or_else(|| ApiError::from_domain(&duet_core::Error::NoPartner(room_id)))?;

  let subscription = store.subscribe_decisions(room_id, partner);
  let events = stream::unfold(subscription, |mut sub| async move {
    let decision = sub.recv().await?;
    let event = Event::default()
      .event("decision")
      .json_data(&decision)
      .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
    Some((Ok(event), sub))
  });

  Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
