//! Handlers for `GET /rooms/{id}/suggestion` and `GET /rooms/{id}/candidates`.
//!
//! Both accept the same filter query parameters. `genres` and `providers` are
//! comma-separated strings; `strict=true` excludes items not available on any
//! of `providers`.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use duet_core::{
  StoreError,
  catalog::{CandidateFilter, CandidatePage, CandidateSource},
  notify::Notifier,
  ranker::{MatchedItem, suggest_best_pick},
  store::SwipeStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  identity::{CurrentUser, member_room},
};

#[derive(Debug, Deserialize, Default)]
pub struct FilterParams {
  pub genres:     Option<String>,
  pub min_year:   Option<i32>,
  pub max_year:   Option<i32>,
  pub min_rating: Option<f64>,
  pub providers:  Option<String>,
  #[serde(default)]
  pub strict:     bool,
  /// Page token from a previous candidates response.
  pub token:      Option<String>,
}

fn split_list(s: Option<&str>) -> Vec<String> {
  s.map(|s| {
    s.split(',')
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_owned)
      .collect()
  })
  .unwrap_or_default()
}

impl FilterParams {
  pub fn filter(&self) -> CandidateFilter {
    CandidateFilter {
      genres:              split_list(self.genres.as_deref()),
      min_year:            self.min_year,
      max_year:            self.max_year,
      min_rating:          self.min_rating,
      providers:           split_list(self.providers.as_deref()),
      strict_availability: self.strict,
    }
  }
}

// ─── Suggestion ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Suggestion {
  /// `None` when no unwatched match passes the filter.
  pub pick: Option<MatchedItem>,
}

/// `GET /rooms/{id}/suggestion`
pub async fn suggest<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Suggestion>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  let store = state.coordinator.store();
  member_room(store.as_ref(), room_id, &user).await?;

  let matches = store.list_matches(room_id).await.map_err(ApiError::from_store)?;
  let ids: Vec<_> = matches.iter().map(|m| m.item_id).collect();
  let items = state.catalog.lookup(&ids).await.map_err(ApiError::from_store)?;

  // Matches whose item the catalog no longer knows are not suggestable.
  let candidates: Vec<MatchedItem> = matches
    .into_iter()
    .filter_map(|record| {
      let item = items.iter().find(|c| c.id == record.item_id)?.clone();
      Some(MatchedItem { record, item })
    })
    .collect();

  let pick = suggest_best_pick(&candidates, &params.filter(), &mut rand::rng()).cloned();
  Ok(Json(Suggestion { pick }))
}

// ─── Candidates ───────────────────────────────────────────────────────────────

/// `GET /rooms/{id}/candidates[?token=...]`
pub async fn candidates<S, N, C>(
  State(state): State<AppState<S, N, C>>,
  CurrentUser(user): CurrentUser,
  Path(room_id): Path<Uuid>,
  Query(params): Query<FilterParams>,
) -> Result<Json<CandidatePage>, ApiError>
where
  S: SwipeStore,
  N: Notifier,
  C: CandidateSource,
  C::Error: StoreError,
{
  member_room(state.coordinator.store().as_ref(), room_id, &user).await?;
  let filter = params.filter();
  let page = state
    .catalog
    .page(&filter, params.token.as_deref())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(page))
}
