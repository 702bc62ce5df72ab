//! Background loops run alongside the HTTP server.
//!
//! - The evaluation worker drains LIKEs whose match evaluation never got
//!   acknowledged, e.g. because the process died mid-request.
//! - The retention worker purges decisions and matches past the retention
//!   window.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use duet_core::{
  coordinator::MatchCoordinator, matches::PurgeReport, notify::Notifier, store::SwipeStore,
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

/// Pending evaluations processed per pass.
pub const EVALUATION_BATCH: usize = 100;

/// One pass of the evaluation worker. Returns the number of evaluations
/// processed.
pub async fn run_evaluation_pass<S, N>(
  coordinator: &MatchCoordinator<S, N>,
) -> Result<usize, S::Error>
where
  S: SwipeStore,
  N: Notifier,
{
  let processed = coordinator.drain_pending(EVALUATION_BATCH).await?;
  if processed > 0 {
    info!(processed, "drained pending evaluations");
  }
  Ok(processed)
}

/// One pass of the retention worker.
pub async fn run_retention_pass<S: SwipeStore>(
  store: &S,
  retention_days: u32,
) -> Result<PurgeReport, S::Error> {
  let cutoff = Utc::now() - TimeDelta::days(i64::from(retention_days));
  let report = store.purge_expired(cutoff).await?;
  if report != PurgeReport::default() {
    info!(%cutoff, decisions = report.decisions, matches = report.matches, "retention purge");
  } else {
    debug!(%cutoff, "retention purge found nothing");
  }
  Ok(report)
}

/// Spawn the evaluation worker, ticking every `every`.
pub fn spawn_evaluation_worker<S, N>(
  coordinator: MatchCoordinator<S, N>,
  every: Duration,
) -> JoinHandle<()>
where
  S: SwipeStore + 'static,
  N: Notifier + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = run_evaluation_pass(&coordinator).await {
        warn!(error = %e, "evaluation pass failed");
      }
    }
  })
}

/// Spawn the retention worker, ticking every `every`.
pub fn spawn_retention_worker<S, N>(
  coordinator: MatchCoordinator<S, N>,
  retention_days: u32,
  every: Duration,
) -> JoinHandle<()>
where
  S: SwipeStore + 'static,
  N: Notifier + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = run_retention_pass(coordinator.store().as_ref(), retention_days).await {
        warn!(error = %e, "retention pass failed");
      }
    }
  })
}
