//! Boundary to the notification dispatcher.
//!
//! Delivery is best effort: the coordinator logs a failed notification and
//! keeps the already-committed match.

use std::future::Future;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::matches::MatchEvent;

#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers match-created signals to the members of a room.
pub trait Notifier: Send + Sync {
  fn notify<'a>(
    &'a self,
    event: &'a MatchEvent,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send + 'a;
}

/// Writes each match event to the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  async fn notify(&self, event: &MatchEvent) -> Result<(), NotifyError> {
    tracing::info!(
      room_id = %event.room_id,
      item_id = event.item_id,
      recipients = ?event.recipients,
      "match notification"
    );
    Ok(())
  }
}

/// Re-publishes match events on a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
  tx: broadcast::Sender<MatchEvent>,
}

impl BroadcastNotifier {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity);
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<MatchEvent> { self.tx.subscribe() }
}

impl Notifier for BroadcastNotifier {
  async fn notify(&self, event: &MatchEvent) -> Result<(), NotifyError> {
    self
      .tx
      .send(event.clone())
      .map(|_| ())
      .map_err(|_| NotifyError("no listeners".into()))
  }
}
