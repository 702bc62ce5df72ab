//! Caller identity and the room membership guard.
//!
//! Authentication happens upstream; the authenticated user id arrives in the
//! [`USER_HEADER`] header.

use axum::{extract::FromRequestParts, http::request::Parts};
use duet_core::{
  room::{Room, UserId},
  store::SwipeStore,
};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user-id";

/// The user making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<T: Send + Sync> FromRequestParts<T> for CurrentUser {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(USER_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;
    UserId::new(raw.trim()).map(CurrentUser).map_err(|_| ApiError::Unauthorized)
  }
}

/// Load `room_id` and fail unless `user` is one of its members.
pub async fn member_room<S: SwipeStore>(
  store: &S,
  room_id: Uuid,
  user: &UserId,
) -> Result<Room, ApiError> {
  let room = store
    .get_room(room_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::from_domain(&duet_core::Error::RoomNotFound(room_id)))?;
  room.ensure_member(user).map_err(|e| ApiError::from_domain(&e))?;
  Ok(room)
}
