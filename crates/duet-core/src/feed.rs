//! Live fan-out of newly recorded decisions.
//!
//! A [`DecisionFeed`] is owned by a store and fed after each committed write.
//! Subscribers receive only decisions written after they subscribed, filtered
//! to one `(room, user)` pair. Dropping a [`DecisionSubscription`] (or calling
//! [`DecisionSubscription::cancel`]) unregisters it immediately.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
  },
};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{decision::Decision, room::UserId};

struct Subscriber {
  room_id: Uuid,
  user_id: UserId,
  tx:      mpsc::UnboundedSender<Decision>,
}

#[derive(Default)]
struct FeedInner {
  next_id:     AtomicU64,
  subscribers: Mutex<HashMap<u64, Subscriber>>,
}

impl FeedInner {
  fn subscribers(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
    self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

/// Registry of live decision subscriptions. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct DecisionFeed {
  inner: Arc<FeedInner>,
}

impl DecisionFeed {
  pub fn new() -> Self { Self::default() }

  /// Register interest in decisions written by `user_id` in `room_id`.
  pub fn subscribe(&self, room_id: Uuid, user_id: UserId) -> DecisionSubscription {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    self
      .inner
      .subscribers()
      .insert(id, Subscriber { room_id, user_id, tx });
    DecisionSubscription { id, feed: Arc::clone(&self.inner), rx }
  }

  /// Deliver `decision` to every matching subscriber.
  pub fn publish(&self, decision: &Decision) {
    let mut subscribers = self.inner.subscribers();
    subscribers.retain(|_, sub| {
      if sub.room_id != decision.room_id || sub.user_id != decision.user_id {
        return true;
      }
      // A closed receiver means the handle is mid-drop.
      sub.tx.send(decision.clone()).is_ok()
    });
  }

  /// Number of registered subscriptions.
  pub fn subscriber_count(&self) -> usize { self.inner.subscribers().len() }
}

/// Handle to a live decision stream. Unregisters itself on drop.
pub struct DecisionSubscription {
  id:   u64,
  feed: Arc<FeedInner>,
  rx:   mpsc::UnboundedReceiver<Decision>,
}

impl DecisionSubscription {
  /// Wait for the next decision. Returns `None` once the feed is gone.
  pub async fn recv(&mut self) -> Option<Decision> { self.rx.recv().await }

  /// Take an already-delivered decision without waiting.
  pub fn try_recv(&mut self) -> Option<Decision> { self.rx.try_recv().ok() }

  /// Stop receiving. Equivalent to dropping the handle.
  pub fn cancel(self) {}
}

impl Drop for DecisionSubscription {
  fn drop(&mut self) {
    self.feed.subscribers().remove(&self.id);
    self.rx.close();
  }
}
