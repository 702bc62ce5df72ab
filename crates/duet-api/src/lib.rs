//! JSON REST API for duet.
//!
//! Exposes an axum [`Router`] backed by any [`SwipeStore`], [`Notifier`] and
//! [`CandidateSource`]. Authentication and TLS are the caller's
//! responsibility; the authenticated user id is read from the
//! [`identity::USER_HEADER`] header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(duet_api::api_router(state.clone()))
//! ```

pub mod decisions;
pub mod error;
pub mod identity;
pub mod matches;
pub mod rooms;
pub mod suggestion;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use duet_core::{
  StoreError, catalog::CandidateSource, coordinator::MatchCoordinator, notify::Notifier,
  store::SwipeStore,
};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S, N, C> {
  pub coordinator: MatchCoordinator<S, N>,
  pub catalog:     Arc<C>,
}

impl<S, N, C> AppState<S, N, C> {
  pub fn new(coordinator: MatchCoordinator<S, N>, catalog: Arc<C>) -> Self {
    Self { coordinator, catalog }
  }
}

impl<S, N, C> Clone for AppState<S, N, C> {
  fn clone(&self) -> Self {
    Self { coordinator: self.coordinator.clone(), catalog: Arc::clone(&self.catalog) }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, N, C>(state: AppState<S, N, C>) -> Router<()>
where
  S: SwipeStore + 'static,
  N: Notifier + 'static,
  C: CandidateSource + 'static,
  C::Error: StoreError,
{
  Router::new()
    // Rooms
    .route("/rooms", post(rooms::create::<S, N, C>))
    .route("/rooms/join", post(rooms::join::<S, N, C>))
    .route("/rooms/{id}", get(rooms::get_one::<S, N, C>))
    .route("/rooms/{id}/leave", post(rooms::leave::<S, N, C>))
    .route("/me/room", get(rooms::mine::<S, N, C>))
    // Decisions
    .route(
      "/rooms/{id}/decisions",
      post(decisions::record::<S, N, C>).delete(decisions::forget::<S, N, C>),
    )
    .route("/rooms/{id}/undo", post(decisions::undo::<S, N, C>))
    .route("/rooms/{id}/partner/decisions", get(decisions::partner_feed::<S, N, C>))
    // Matches
    .route("/rooms/{id}/matches", get(matches::list::<S, N, C>))
    .route(
      "/rooms/{id}/matches/{item_id}/watched",
      post(matches::mark_watched::<S, N, C>),
    )
    // Suggestions
    .route("/rooms/{id}/suggestion", get(suggestion::suggest::<S, N, C>))
    .route("/rooms/{id}/candidates", get(suggestion::candidates::<S, N, C>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
