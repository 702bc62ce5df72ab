//! Handlers for room lifecycle endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/rooms` | 201 with the room and its invite code |
//! | `POST` | `/rooms/join` | Body: `{"code":"BAK-TOF"}` |
//! | `GET`  | `/rooms/{id}` | Members only |
//! | `POST` | `/rooms/{id}/leave` | 204; the room is deleted once empty |
//! | `GET`  | `/me/room` | `{"room_id": null}` when not in a room |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use duet_core::{
  StoreError,
  catalog::CandidateSource,
  notify::Notifier,
  room::{InviteCode, Room},
  store::SwipeStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, JsonBody},
  identity::{CurrentUser, member_room},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /rooms`
pub async fn create<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let created = state
    .coordinator
    .store()
    .create_room(user)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Join ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JoinBody {
  pub code: String,
}

/// `POST /rooms/join`, body: `{"code":"BAK-TOF"}`
pub async fn join<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  JsonBody(body): JsonBody<JoinBody>,
) -> Result<Json<Room>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let code = InviteCode::parse(&body.code).map_err(|e| ApiError::from_domain(&e))?;
  let room = state
    .coordinator
    .store()
    .join_room(user, &code)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(room))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /rooms/{id}`
pub async fn get_one<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
) -> Result<Json<Room>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let room = member_room(state.coordinator.store().as_ref(), room_id, &user).await?;
  Ok(Json(room))
}

// ─── Leave ────────────────────────────────────────────────────────────────────

/// `POST /rooms/{id}/leave`
pub async fn leave<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let store = state.coordinator.store();
  member_room(store.as_ref(), room_id, &user).await?;
  store.leave_room(user, room_id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Current room ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MyRoom {
  pub room_id: Option<Uuid>,
}

/// `GET /me/room`
pub async fn mine<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<MyRoom>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let room_id = state
    .coordinator
    .store()
    .room_for_user(&user)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(MyRoom { room_id }))
}
