//! duet server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, starts the background workers and serves the
//! JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use duet_api::AppState;
use duet_core::{catalog::StaticCatalog, coordinator::MatchCoordinator, notify::TracingNotifier};
use duet_server::{ServerConfig, workers};
use duet_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "duet swipe-to-match server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("DUET"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let catalog = match &server_cfg.catalog_path {
    Some(path) => {
      let path = expand_tilde(path);
      StaticCatalog::from_json_file(&path)
        .with_context(|| format!("failed to load catalog from {path:?}"))?
    }
    None => StaticCatalog::default(),
  };
  tracing::info!(items = catalog.len(), "catalog loaded");

  let coordinator = MatchCoordinator::new(Arc::new(store), Arc::new(TracingNotifier));

  workers::spawn_evaluation_worker(
    coordinator.clone(),
    Duration::from_secs(server_cfg.evaluation_interval_secs.max(1)),
  );
  workers::spawn_retention_worker(
    coordinator.clone(),
    server_cfg.retention_days,
    Duration::from_secs(server_cfg.retention_interval_secs.max(1)),
  );

  let app = duet_server::router(AppState::new(coordinator, Arc::new(catalog)));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
