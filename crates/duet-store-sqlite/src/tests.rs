//! Integration tests for `SqliteStore` and the match coordinator running on
//! top of it, against an in-memory database.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use duet_core::{
  StoreError,
  coordinator::MatchCoordinator,
  decision::{Decision, Verdict},
  matches::{Evaluation, MatchCreation, MatchEvent},
  notify::{BroadcastNotifier, Notifier, NotifyError},
  room::{InviteCode, Room, UserId},
  store::SwipeStore,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn user(name: &str) -> UserId { UserId::new(name).unwrap() }

fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap() }

fn domain(err: &crate::Error) -> &duet_core::Error {
  err.domain().expect("domain error")
}

/// A room with members `a` and `b`.
async fn paired_room(s: &SqliteStore) -> Room {
  let created = s.create_room(user("a")).await.unwrap();
  s.join_room(user("b"), &created.invite_code).await.unwrap()
}

type Coordinator = MatchCoordinator<SqliteStore, BroadcastNotifier>;

async fn coordinator() -> (Coordinator, broadcast::Receiver<MatchEvent>) {
  let notifier = BroadcastNotifier::new(64);
  let events = notifier.subscribe();
  let c = MatchCoordinator::new(Arc::new(store().await), Arc::new(notifier));
  (c, events)
}

async fn swipe(c: &Coordinator, room: &Room, who: &str, item: i64, verdict: Verdict, t: i64) -> Option<Evaluation> {
  c.record_decision_at(Decision::new(room.room_id, user(who), item, verdict, at(t)))
    .await
    .unwrap()
    .1
}

// ─── Room directory ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_room_is_visible_with_its_code() {
  let s = store().await;
  let created = s.create_room(user("a")).await.unwrap();

  assert_eq!(created.room.members, vec![user("a")]);
  assert!(InviteCode::parse(created.invite_code.as_str()).is_ok());

  let fetched = s.get_room(created.room.room_id).await.unwrap().unwrap();
  assert_eq!(fetched, created.room);
  assert_eq!(s.room_for_user(&user("a")).await.unwrap(), Some(created.room.room_id));
}

#[tokio::test]
async fn invite_code_resolves_to_originating_room() {
  let s = store().await;
  let created = s.create_room(user("a")).await.unwrap();
  let typed = InviteCode::parse(&created.invite_code.as_str().to_lowercase()).unwrap();

  let joined = s.join_room(user("b"), &typed).await.unwrap();
  assert_eq!(joined.room_id, created.room.room_id);
  assert_eq!(joined.members, vec![user("a"), user("b")]);
  assert_eq!(s.room_for_user(&user("b")).await.unwrap(), Some(joined.room_id));
}

#[tokio::test]
async fn get_room_missing_returns_none() {
  let s = store().await;
  assert!(s.get_room(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn join_unknown_code_errors() {
  let s = store().await;
  let code = InviteCode::parse("BAK-TOF").unwrap();
  let err = s.join_room(user("b"), &code).await.unwrap_err();
  assert!(matches!(domain(&err), duet_core::Error::InviteCodeNotFound(_)));
}

#[tokio::test]
async fn join_twice_is_already_member() {
  let s = store().await;
  let created = s.create_room(user("a")).await.unwrap();
  let err = s.join_room(user("a"), &created.invite_code).await.unwrap_err();
  assert!(matches!(domain(&err), duet_core::Error::AlreadyMember { .. }));
}

#[tokio::test]
async fn third_join_is_room_full() {
  let s = store().await;
  let created = s.create_room(user("a")).await.unwrap();
  s.join_room(user("b"), &created.invite_code).await.unwrap();

  let err = s.join_room(user("c"), &created.invite_code).await.unwrap_err();
  assert!(matches!(domain(&err), duet_core::Error::RoomFull(id) if *id == created.room.room_id));
}

#[tokio::test]
async fn already_member_takes_priority_over_full() {
  let s = store().await;
  let created = s.create_room(user("a")).await.unwrap();
  s.join_room(user("b"), &created.invite_code).await.unwrap();

  let err = s.join_room(user("b"), &created.invite_code).await.unwrap_err();
  assert!(matches!(domain(&err), duet_core::Error::AlreadyMember { .. }));
}

#[tokio::test]
async fn concurrent_joins_admit_exactly_one() {
  for _ in 0..10 {
    let s = Arc::new(store().await);
    let created = s.create_room(user("a")).await.unwrap();

    let joins = ["b", "c", "d"].map(|name| {
      let s = Arc::clone(&s);
      let code = created.invite_code.clone();
      tokio::spawn(async move { s.join_room(user(name), &code).await })
    });

    let mut ok = 0;
    for join in joins {
      match join.await.unwrap() {
        Ok(_) => ok += 1,
        Err(e) => assert!(matches!(domain(&e), duet_core::Error::RoomFull(_))),
      }
    }
    assert_eq!(ok, 1);
    let room = s.get_room(created.room.room_id).await.unwrap().unwrap();
    assert_eq!(room.members.len(), 2);
  }
}

#[tokio::test]
async fn leaving_last_member_deletes_room_and_code_reports_gone() {
  let s = store().await;
  let created = s.create_room(user("a")).await.unwrap();
  let room_id = created.room.room_id;

  s.leave_room(user("a"), room_id).await.unwrap();
  assert!(s.get_room(room_id).await.unwrap().is_none());
  assert!(s.room_for_user(&user("a")).await.unwrap().is_none());

  let err = s.join_room(user("b"), &created.invite_code).await.unwrap_err();
  assert!(matches!(domain(&err), duet_core::Error::RoomNoLongerExists(id) if *id == room_id));
}

#[tokio::test]
async fn leaving_keeps_room_for_remaining_member() {
  let s = store().await;
  let room = paired_room(&s).await;

  s.leave_room(user("a"), room.room_id).await.unwrap();
  let room = s.get_room(room.room_id).await.unwrap().unwrap();
  assert_eq!(room.members, vec![user("b")]);
  assert!(s.room_for_user(&user("a")).await.unwrap().is_none());
  assert_eq!(s.room_for_user(&user("b")).await.unwrap(), Some(room.room_id));
}

#[tokio::test]
async fn leaving_an_earlier_room_keeps_the_current_one() {
  let s = store().await;
  let first = s.create_room(user("a")).await.unwrap().room.room_id;
  let second = s.create_room(user("a")).await.unwrap().room.room_id;

  s.leave_room(user("a"), first).await.unwrap();
  assert!(s.get_room(first).await.unwrap().is_none());
  assert_eq!(s.room_for_user(&user("a")).await.unwrap(), Some(second));
}

// ─── Decision log ────────────────────────────────────────────────────────────

#[tokio::test]
async fn rewriting_a_decision_overwrites_it() {
  let s = store().await;
  let room = paired_room(&s).await;

  s.record_decision(Decision::new(room.room_id, user("a"), 7, Verdict::Like, at(1)))
    .await
    .unwrap();
  s.record_decision(Decision::new(room.room_id, user("a"), 7, Verdict::Pass, at(2)))
    .await
    .unwrap();

  let decisions = s.decisions_for_item(room.room_id, 7).await.unwrap();
  assert_eq!(decisions.len(), 1);
  assert_eq!(decisions[0].verdict, Verdict::Pass);
}

#[tokio::test]
async fn only_likes_enqueue_an_evaluation() {
  let s = store().await;
  let room = paired_room(&s).await;

  let like = s
    .record_decision(Decision::new(room.room_id, user("a"), 1, Verdict::Like, at(1)))
    .await
    .unwrap();
  let pass = s
    .record_decision(Decision::new(room.room_id, user("a"), 2, Verdict::Pass, at(2)))
    .await
    .unwrap();

  assert!(like.evaluation.is_some());
  assert!(pass.evaluation.is_none());
  let pending = s.pending_evaluations(10).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].item_id, 1);
}

#[tokio::test]
async fn undo_removes_most_recent_only() {
  let s = store().await;
  let room = paired_room(&s).await;
  for (item, t) in [(1, 1), (2, 2), (3, 3)] {
    s.record_decision(Decision::new(room.room_id, user("a"), item, Verdict::Pass, at(t)))
      .await
      .unwrap();
  }

  let outcome = s.undo_last_decision(room.room_id, &user("a")).await.unwrap();
  assert!(!outcome.match_removed);
  let undone = outcome.undone.unwrap();
  assert_eq!(undone.item_id, 3);
  assert_eq!(undone.decided_at, at(3));

  let left: Vec<_> = s
    .decisions_for_user(room.room_id, &user("a"))
    .await
    .unwrap()
    .into_iter()
    .map(|d| d.item_id)
    .collect();
  assert_eq!(left, vec![1, 2]);
}

#[tokio::test]
async fn undo_uses_timestamps_not_write_order() {
  let s = store().await;
  let room = paired_room(&s).await;
  s.record_decision(Decision::new(room.room_id, user("a"), 1, Verdict::Pass, at(10)))
    .await
    .unwrap();
  s.record_decision(Decision::new(room.room_id, user("a"), 2, Verdict::Pass, at(5)))
    .await
    .unwrap();

  let undone = s.undo_last_decision(room.room_id, &user("a")).await.unwrap().undone.unwrap();
  assert_eq!(undone.item_id, 1);
}

#[tokio::test]
async fn undo_orders_sub_microsecond_timestamps() {
  let s = store().await;
  let room = paired_room(&s).await;
  s.record_decision(Decision::new(room.room_id, user("a"), 1, Verdict::Pass, at(1) + Duration::nanoseconds(500)))
    .await
    .unwrap();
  s.record_decision(Decision::new(room.room_id, user("a"), 2, Verdict::Pass, at(1) + Duration::nanoseconds(200)))
    .await
    .unwrap();

  let undone = s.undo_last_decision(room.room_id, &user("a")).await.unwrap().undone.unwrap();
  assert_eq!(undone.item_id, 1);
}

#[tokio::test]
async fn decision_timestamps_round_trip_exactly() {
  let s = store().await;
  let room = paired_room(&s).await;
  let decided_at = at(1) + Duration::nanoseconds(123_456_789);

  let recorded = s
    .record_decision(Decision::new(room.room_id, user("a"), 5, Verdict::Like, decided_at))
    .await
    .unwrap();
  assert_eq!(recorded.decision.decided_at, decided_at);

  let stored = s.decisions_for_item(room.room_id, 5).await.unwrap();
  assert_eq!(stored[0].decided_at, decided_at);
  let undone = s.undo_last_decision(room.room_id, &user("a")).await.unwrap().undone.unwrap();
  assert_eq!(undone.decided_at, decided_at);
}

#[tokio::test]
async fn unstorable_timestamp_is_rejected() {
  let s = store().await;
  let room = paired_room(&s).await;
  let far = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();

  let err = s
    .record_decision(Decision::new(room.room_id, user("a"), 1, Verdict::Pass, far))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Timestamp(t) if t == far));
  assert!(s.decisions_for_user(room.room_id, &user("a")).await.unwrap().is_empty());
}

#[test]
fn next_seq_is_served_by_an_index() {
  let conn = rusqlite::Connection::open_in_memory().unwrap();
  conn.execute_batch(crate::schema::SCHEMA).unwrap();

  let mut stmt = conn
    .prepare(&format!("EXPLAIN QUERY PLAN {}", crate::store::NEXT_SEQ))
    .unwrap();
  let plan: Vec<String> = stmt
    .query_map([], |row| row.get(3))
    .unwrap()
    .collect::<rusqlite::Result<_>>()
    .unwrap();
  assert!(plan.iter().any(|step| step.contains("decisions_seq_idx")), "{plan:?}");
}

#[tokio::test]
async fn undo_with_nothing_recorded_returns_none() {
  let s = store().await;
  let room = paired_room(&s).await;
  let outcome = s.undo_last_decision(room.room_id, &user("a")).await.unwrap();
  assert!(outcome.undone.is_none());
  assert!(!outcome.match_removed);
}

#[tokio::test]
async fn undoing_a_like_deletes_its_match_in_one_step() {
  let s = store().await;
  let room = paired_room(&s).await;
  for (who, t) in [("a", 1), ("b", 2)] {
    s.record_decision(Decision::new(room.room_id, user(who), 42, Verdict::Like, at(t)))
      .await
      .unwrap();
  }
  let created = s.create_match_if_absent(room.room_id, 42, Utc::now()).await.unwrap();
  assert!(matches!(created, MatchCreation::Created { .. }));

  let outcome = s.undo_last_decision(room.room_id, &user("b")).await.unwrap();
  assert_eq!(outcome.undone.map(|d| d.item_id), Some(42));
  assert!(outcome.match_removed);
  assert!(s.get_match(room.room_id, 42).await.unwrap().is_none());

  let left = s.decisions_for_item(room.room_id, 42).await.unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].user_id, user("a"));
}

#[tokio::test]
async fn partner_subscription_sees_new_writes_only() {
  let s = store().await;
  let room = paired_room(&s).await;
  s.record_decision(Decision::new(room.room_id, user("b"), 1, Verdict::Like, at(1)))
    .await
    .unwrap();

  let mut sub = s.subscribe_decisions(room.room_id, user("b"));
  s.record_decision(Decision::new(room.room_id, user("a"), 2, Verdict::Like, at(2)))
    .await
    .unwrap();
  s.record_decision(Decision::new(room.room_id, user("b"), 3, Verdict::Pass, at(3)))
    .await
    .unwrap();
  s.record_decision(Decision::new(room.room_id, user("b"), 3, Verdict::Like, at(4)))
    .await
    .unwrap();

  let first = sub.recv().await.unwrap();
  let second = sub.recv().await.unwrap();
  assert_eq!((first.item_id, first.verdict), (3, Verdict::Pass));
  assert_eq!((second.item_id, second.verdict), (3, Verdict::Like));
  assert!(sub.try_recv().is_none());

  assert_eq!(s.feed().subscriber_count(), 1);
  sub.cancel();
  assert_eq!(s.feed().subscriber_count(), 0);
}

// ─── Matches ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_match_rechecks_inside_transaction() {
  let s = store().await;
  let room = paired_room(&s).await;
  for who in ["a", "b"] {
    s.record_decision(Decision::new(room.room_id, user(who), 9, Verdict::Like, at(1)))
      .await
      .unwrap();
  }

  let first = s.create_match_if_absent(room.room_id, 9, at(2)).await.unwrap();
  let second = s.create_match_if_absent(room.room_id, 9, at(3)).await.unwrap();
  match first {
    MatchCreation::Created { record, members } => {
      assert_eq!(record.created_at, at(2));
      assert_eq!(members, vec![user("a"), user("b")]);
    }
    other => panic!("expected creation, got {other:?}"),
  }
  assert!(matches!(second, MatchCreation::AlreadyMatched));
}

#[tokio::test]
async fn create_match_ignores_likes_from_former_members() {
  let s = store().await;
  let room = paired_room(&s).await;
  for who in ["a", "b"] {
    s.record_decision(Decision::new(room.room_id, user(who), 9, Verdict::Like, at(1)))
      .await
      .unwrap();
  }
  s.leave_room(user("b"), room.room_id).await.unwrap();

  let outcome = s.create_match_if_absent(room.room_id, 9, at(2)).await.unwrap();
  assert!(matches!(outcome, MatchCreation::NotEnoughLikes));
}

#[tokio::test]
async fn mark_watched_sets_flag_and_notes() {
  let (c, _events) = coordinator().await;
  let room = paired_room(c.store()).await;
  swipe(&c, &room, "a", 5, Verdict::Like, 1).await;
  swipe(&c, &room, "b", 5, Verdict::Like, 2).await;

  let m = c.store().mark_watched(room.room_id, 5, "great ending".into()).await.unwrap();
  assert!(m.watched);
  assert_eq!(m.notes, "great ending");

  let err = c.store().mark_watched(room.room_id, 6, String::new()).await.unwrap_err();
  assert!(matches!(domain(&err), duet_core::Error::MatchNotFound { item_id: 6, .. }));
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_like_does_not_match() {
  let (c, mut events) = coordinator().await;
  let room = paired_room(c.store()).await;

  let eval = swipe(&c, &room, "a", 42, Verdict::Like, 1).await;
  assert_eq!(eval, Some(Evaluation::NotEnoughLikes));
  assert!(c.store().get_match(room.room_id, 42).await.unwrap().is_none());
  assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn like_and_pass_do_not_match() {
  let (c, _events) = coordinator().await;
  let room = paired_room(c.store()).await;

  swipe(&c, &room, "a", 42, Verdict::Like, 1).await;
  assert_eq!(swipe(&c, &room, "b", 42, Verdict::Pass, 2).await, None);
  assert!(c.store().list_matches(room.room_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn match_undo_scenario() {
  let (c, mut events) = coordinator().await;
  let room = paired_room(c.store()).await;

  swipe(&c, &room, "a", 42, Verdict::Like, 1).await;
  let eval = swipe(&c, &room, "b", 42, Verdict::Like, 2).await.unwrap();
  assert!(eval.created().is_some());

  let event = events.try_recv().unwrap();
  assert_eq!(event.item_id, 42);
  assert_eq!(event.room_id, room.room_id);
  assert_eq!(event.recipients, vec![user("a"), user("b")]);

  let outcome = c.undo_last_decision(room.room_id, &user("a")).await.unwrap();
  assert_eq!(outcome.undone.map(|d| d.item_id), Some(42));
  assert!(outcome.match_removed);

  assert!(c.store().get_match(room.room_id, 42).await.unwrap().is_none());
  let left = c.store().decisions_for_item(room.room_id, 42).await.unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].user_id, user("b"));
  assert_eq!(left[0].verdict, Verdict::Like);
  assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn relike_after_undo_creates_fresh_match() {
  let (c, mut events) = coordinator().await;
  let room = paired_room(c.store()).await;

  swipe(&c, &room, "a", 42, Verdict::Like, 1).await;
  let first = swipe(&c, &room, "b", 42, Verdict::Like, 2).await.unwrap();
  let first = first.created().unwrap().clone();
  c.undo_last_decision(room.room_id, &user("b")).await.unwrap();

  tokio::time::sleep(std::time::Duration::from_millis(2)).await;
  let second = swipe(&c, &room, "b", 42, Verdict::Like, 3).await.unwrap();
  let second = second.created().unwrap().clone();

  assert!(second.created_at > first.created_at);
  assert_eq!(c.store().list_matches(room.room_id).await.unwrap().len(), 1);
  assert!(events.try_recv().is_ok());
  assert!(events.try_recv().is_ok());
}

#[tokio::test]
async fn undoing_a_pass_never_removes_a_match() {
  let (c, _events) = coordinator().await;
  let room = paired_room(c.store()).await;

  swipe(&c, &room, "a", 1, Verdict::Like, 1).await;
  swipe(&c, &room, "b", 1, Verdict::Like, 2).await;
  swipe(&c, &room, "a", 2, Verdict::Pass, 3).await;

  let outcome = c.undo_last_decision(room.room_id, &user("a")).await.unwrap();
  assert_eq!(outcome.undone.map(|d| d.verdict), Some(Verdict::Pass));
  assert!(!outcome.match_removed);
  assert!(c.store().get_match(room.room_id, 1).await.unwrap().is_some());
}

#[tokio::test]
async fn evaluation_is_idempotent() {
  let (c, mut events) = coordinator().await;
  let room = paired_room(c.store()).await;
  swipe(&c, &room, "a", 8, Verdict::Like, 1).await;
  swipe(&c, &room, "b", 8, Verdict::Like, 2).await;

  for _ in 0..3 {
    let eval = c.evaluate_for_match(room.room_id, 8).await.unwrap();
    assert_eq!(eval, Evaluation::AlreadyMatched);
  }
  assert!(events.try_recv().is_ok());
  assert!(events.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_create_exactly_one_match() {
  let (c, mut events) = coordinator().await;
  let room = paired_room(c.store()).await;

  for item in 0..25 {
    let swipes = ["a", "b"].map(|who| {
      let c = c.clone();
      let decision = Decision::new(room.room_id, user(who), item, Verdict::Like, Utc::now());
      tokio::spawn(async move { c.record_decision_at(decision).await })
    });
    for s in swipes {
      s.await.unwrap().unwrap();
    }

    let matches: Vec<_> = c
      .store()
      .list_matches(room.room_id)
      .await
      .unwrap()
      .into_iter()
      .filter(|m| m.item_id == item)
      .collect();
    assert_eq!(matches.len(), 1, "item {item}");
    assert_eq!(events.try_recv().unwrap().item_id, item);
    assert!(events.try_recv().is_err(), "duplicate notification for item {item}");
  }
  assert!(c.store().pending_evaluations(100).await.unwrap().is_empty());
}

#[tokio::test]
async fn drain_pending_recovers_a_skipped_evaluation() {
  let (c, mut events) = coordinator().await;
  let room = paired_room(c.store()).await;

  // Write both likes straight into the log, as if the process died before
  // the synchronous evaluation ran.
  for who in ["a", "b"] {
    c.store()
      .record_decision(Decision::new(room.room_id, user(who), 77, Verdict::Like, at(1)))
      .await
      .unwrap();
  }
  assert!(c.store().get_match(room.room_id, 77).await.unwrap().is_none());

  let processed = c.drain_pending(10).await.unwrap();
  assert_eq!(processed, 2);
  assert!(c.store().get_match(room.room_id, 77).await.unwrap().is_some());
  assert!(c.store().pending_evaluations(10).await.unwrap().is_empty());
  assert!(events.try_recv().is_ok());
  assert!(events.try_recv().is_err());
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
  async fn notify(&self, _event: &MatchEvent) -> Result<(), NotifyError> {
    Err(NotifyError("device unreachable".into()))
  }
}

#[tokio::test]
async fn notification_failure_keeps_the_match() {
  let c = MatchCoordinator::new(Arc::new(store().await), Arc::new(FailingNotifier));
  let room = paired_room(c.store()).await;

  for (who, t) in [("a", 1), ("b", 2)] {
    c.record_decision_at(Decision::new(room.room_id, user(who), 3, Verdict::Like, at(t)))
      .await
      .unwrap();
  }
  assert!(c.store().get_match(room.room_id, 3).await.unwrap().is_some());
}

// ─── Retention ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_expired_keeps_watched_and_noted_matches() {
  let (c, _events) = coordinator().await;
  let room = paired_room(c.store()).await;
  for item in [1, 2, 3] {
    swipe(&c, &room, "a", item, Verdict::Like, 1).await;
    swipe(&c, &room, "b", item, Verdict::Like, 2).await;
  }
  c.store().mark_watched(room.room_id, 1, "date night".into()).await.unwrap();
  c.store().mark_watched(room.room_id, 2, String::new()).await.unwrap();

  let cutoff = Utc::now() + Duration::days(1);
  let report = c.store().purge_expired(cutoff).await.unwrap();
  assert_eq!(report.decisions, 6);
  assert_eq!(report.matches, 2);

  let left: Vec<_> = c
    .store()
    .list_matches(room.room_id)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.item_id)
    .collect();
  assert_eq!(left, vec![1]);
}

#[tokio::test]
async fn purge_expired_leaves_recent_rows() {
  let (c, _events) = coordinator().await;
  let room = paired_room(c.store()).await;
  swipe(&c, &room, "a", 1, Verdict::Like, 1).await;

  let report = c.store().purge_expired(at(0)).await.unwrap();
  assert_eq!(report, Default::default());
}

#[tokio::test]
async fn deleting_user_decisions_drops_orphaned_matches() {
  let (c, _events) = coordinator().await;
  let room = paired_room(c.store()).await;
  for item in [1, 2] {
    swipe(&c, &room, "a", item, Verdict::Like, item).await;
    swipe(&c, &room, "b", item, Verdict::Like, item + 10).await;
  }
  swipe(&c, &room, "a", 3, Verdict::Pass, 20).await;
  c.store().mark_watched(room.room_id, 2, "keep".into()).await.unwrap();

  let report = c.forget_user_decisions(room.room_id, &user("a")).await.unwrap();
  assert_eq!(report.decisions, 3);
  assert_eq!(report.matches, 1);

  assert!(c.store().get_match(room.room_id, 1).await.unwrap().is_none());
  assert!(c.store().get_match(room.room_id, 2).await.unwrap().is_some());
  assert!(c.store().decisions_for_user(room.room_id, &user("a")).await.unwrap().is_empty());
  assert_eq!(c.store().decisions_for_user(room.room_id, &user("b")).await.unwrap().len(), 2);
}
