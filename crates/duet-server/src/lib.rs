//! HTTP server wiring for duet.
//!
//! Holds the runtime configuration, the top-level router (the JSON API plus
//! request tracing) and the background workers that keep the match state
//! honest between requests.

pub mod workers;

use std::path::PathBuf;

use axum::{Router, routing::get};
use duet_api::AppState;
use duet_core::{StoreError, catalog::CandidateSource, notify::Notifier, store::SwipeStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DUET_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                     String,
  #[serde(default = "default_port")]
  pub port:                     u16,
  #[serde(default = "default_store_path")]
  pub store_path:               PathBuf,
  /// JSON array of candidates served by the static catalog.
  #[serde(default)]
  pub catalog_path:             Option<PathBuf>,
  #[serde(default = "default_retention_days")]
  pub retention_days:           u32,
  #[serde(default = "default_retention_interval")]
  pub retention_interval_secs:  u64,
  #[serde(default = "default_evaluation_interval")]
  pub evaluation_interval_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/duet/duet.db") }
fn default_retention_days() -> u32 { 90 }
fn default_retention_interval() -> u64 { 3600 }
fn default_evaluation_interval() -> u64 { 5 }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, N, C>(state: AppState<S, N, C>) -> Router
where
  S: SwipeStore + 'static,
  N: Notifier + 'static,
  C: CandidateSource + 'static,
  C::Error: StoreError,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .merge(duet_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
