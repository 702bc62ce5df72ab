//! Handlers for `/rooms/{id}/matches` endpoints.

use axum::{
  Json,
  extract::{Path, State},
};
use duet_core::{
  StoreError,
  catalog::CandidateSource,
  decision::ItemId,
  matches::Match,
  notify::Notifier,
  store::SwipeStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, JsonBody},
  identity::{CurrentUser, member_room},
};

/// `GET /rooms/{id}/matches`, newest first.
pub async fn list<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<Match>>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let store = state.coordinator.store();
  member_room(store.as_ref(), room_id, &user).await?;
  let matches = store.list_matches(room_id).await.map_err(ApiError::from_store)?;
  Ok(Json(matches))
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchedBody {
  #[serde(default)]
  pub notes: String,
}

/// `POST /rooms/{id}/matches/{item_id}/watched`, body: `{"notes":"..."}`
pub async fn mark_watched<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path((room_id, item_id)): Path<(Uuid, ItemId)>,
  JsonBody(body): JsonBody<WatchedBody>,
) -> Result<Json<Match>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let store = state.coordinator.store();
  member_room(store.as_ref(), room_id, &user).await?;
  let updated = store
    .mark_watched(room_id, item_id, body.notes)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(updated))
}
