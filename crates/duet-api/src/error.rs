//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::{FromRequest, rejection::JsonRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use duet_core::{ErrorKind, StoreError};
use serde_json::json;
use thiserror::Error;

/// Message shown for storage failures; the details only go to the log.
const RETRY_MESSAGE: &str = "something went wrong on our side, please try again";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("missing or empty x-user-id header")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a domain outcome onto its HTTP category.
  pub fn from_domain(err: &duet_core::Error) -> Self {
    let message = err.to_string();
    match err.kind() {
      ErrorKind::Validation => Self::BadRequest(message),
      ErrorKind::NotFound => Self::NotFound(message),
      ErrorKind::Conflict => Self::Conflict(message),
      ErrorKind::Forbidden => Self::Forbidden(message),
      ErrorKind::Infrastructure => Self::Store(message.into()),
    }
  }

  /// Map a backend error, recovering the domain outcome it wraps if any.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    if let Some(domain) = err.domain() {
      return Self::from_domain(domain);
    }
    Self::Store(Box::new(err))
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

/// [`axum::Json`] whose rejection is reported as an [`ApiError`], so a
/// malformed body gets the same `{"error": ...}` shape as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, RETRY_MESSAGE.to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
