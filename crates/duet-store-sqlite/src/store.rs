//! [`SqliteStore`], the SQLite implementation of [`SwipeStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use duet_core::{
  decision::{Decision, ItemId, PendingEvaluation, RecordedDecision, Verdict},
  feed::{DecisionFeed, DecisionSubscription},
  matches::{Match, MatchCreation, PurgeReport, UndoOutcome},
  room::{CreatedRoom, INVITE_CODE_ATTEMPTS, InviteCode, ROOM_CAPACITY, Room, UserId},
  store::SwipeStore,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  encode::{
    RawDecision, RawMatch, RawPending, RawRoom, decode_user, decode_uuid, encode_ts,
    encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

/// Likes from distinct users needed for a match.
const LIKES_FOR_MATCH: i64 = 2;

/// Retention keeps matches that are watched and carry notes.
const NOT_RETAINED: &str = "NOT (watched = 1 AND TRIM(notes) != '')";

/// Next write-order value; served from `decisions_seq_idx`.
pub(crate) const NEXT_SEQ: &str = "SELECT COALESCE(MAX(seq), 0) + 1 FROM decisions";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A duet store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and the decision feed are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  feed: DecisionFeed,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, feed: DecisionFeed::new() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, feed: DecisionFeed::new() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The feed that live partner subscriptions are served from.
  pub fn feed(&self) -> &DecisionFeed { &self.feed }
}

// ─── Row helpers (run on the database thread) ────────────────────────────────

fn select_members(conn: &Connection, room_id: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT user_id FROM room_members WHERE room_id = ?1 ORDER BY joined_at, rowid",
  )?;
  stmt
    .query_map(rusqlite::params![room_id], |row| row.get(0))?
    .collect()
}

fn select_room(conn: &Connection, room_id: &str) -> rusqlite::Result<Option<RawRoom>> {
  let created_at: Option<i64> = conn
    .query_row(
      "SELECT created_at FROM rooms WHERE room_id = ?1",
      rusqlite::params![room_id],
      |row| row.get(0),
    )
    .optional()?;
  let Some(created_at) = created_at else { return Ok(None) };
  Ok(Some(RawRoom {
    room_id: room_id.to_owned(),
    created_at,
    members: select_members(conn, room_id)?,
  }))
}

fn select_match(conn: &Connection, room_id: &str, item_id: i64) -> rusqlite::Result<Option<RawMatch>> {
  conn
    .query_row(
      &format!("SELECT {} FROM matches WHERE room_id = ?1 AND item_id = ?2", RawMatch::COLUMNS),
      rusqlite::params![room_id, item_id],
      RawMatch::from_row,
    )
    .optional()
}

/// Delete the match on an item whose decision was just undone. A PASS never
/// produced a match, so undoing one leaves matches alone.
fn rollback_on_undo(
  conn: &Connection,
  room_id: &str,
  item_id: i64,
  undone_verdict: &str,
) -> rusqlite::Result<bool> {
  if undone_verdict != Verdict::Like.as_str() {
    return Ok(false);
  }
  let deleted = conn.execute(
    "DELETE FROM matches WHERE room_id = ?1 AND item_id = ?2",
    rusqlite::params![room_id, item_id],
  )?;
  Ok(deleted > 0)
}

fn count_likes(conn: &Connection, room_id: &str, item_id: i64) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM decisions
     WHERE room_id = ?1 AND item_id = ?2 AND verdict = 'like'",
    rusqlite::params![room_id, item_id],
    |row| row.get(0),
  )
}

// ─── Internal outcomes ───────────────────────────────────────────────────────

enum JoinRejection {
  CodeNotFound,
  RoomGone(String),
  AlreadyMember(String),
  Full(String),
}

enum RawCreation {
  Created(RawMatch, Vec<String>),
  AlreadyMatched,
  NotEnoughLikes,
}

// ─── SwipeStore impl ─────────────────────────────────────────────────────────

impl SwipeStore for SqliteStore {
  type Error = Error;

  // ── Room directory ────────────────────────────────────────────────────────

  async fn create_room(&self, user: UserId) -> Result<CreatedRoom> {
    let room_id  = Uuid::new_v4();
    let now      = Utc::now();
    let id_str   = encode_uuid(room_id);
    let at       = encode_ts(now)?;
    let user_str = user.as_str().to_owned();

    let code: Option<InviteCode> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut rng = rand::rng();
        let mut free = None;
        for _ in 0..INVITE_CODE_ATTEMPTS {
          let candidate = InviteCode::generate(&mut rng);
          let taken = tx
            .query_row(
              "SELECT 1 FROM invite_codes WHERE code = ?1",
              rusqlite::params![candidate.as_str()],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !taken {
            free = Some(candidate);
            break;
          }
        }
        let Some(code) = free else { return Ok(None) };

        tx.execute(
          "INSERT INTO rooms (room_id, created_at) VALUES (?1, ?2)",
          rusqlite::params![id_str, at],
        )?;
        tx.execute(
          "INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, user_str, at],
        )?;
        tx.execute(
          "INSERT INTO invite_codes (code, room_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![code.as_str(), id_str, at],
        )?;
        tx.execute(
          "INSERT INTO user_rooms (user_id, room_id) VALUES (?1, ?2)
           ON CONFLICT (user_id) DO UPDATE SET room_id = excluded.room_id",
          rusqlite::params![user_str, id_str],
        )?;
        tx.commit()?;
        Ok(Some(code))
      })
      .await?;

    let invite_code =
      code.ok_or(duet_core::Error::InviteCodeExhausted(INVITE_CODE_ATTEMPTS))?;
    tracing::info!(%room_id, %user, code = %invite_code, "room created");

    Ok(CreatedRoom {
      room: Room { room_id, members: vec![user], created_at: now },
      invite_code,
    })
  }

  async fn join_room(&self, user: UserId, code: &InviteCode) -> Result<Room> {
    let code_str = code.as_str().to_owned();
    let user_str = user.as_str().to_owned();
    let at       = encode_ts(Utc::now())?;

    let outcome: std::result::Result<RawRoom, JoinRejection> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let room_id: Option<String> = tx
          .query_row(
            "SELECT room_id FROM invite_codes WHERE code = ?1",
            rusqlite::params![code_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(room_id) = room_id else {
          return Ok(Err(JoinRejection::CodeNotFound));
        };

        let Some(mut room) = select_room(&tx, &room_id)? else {
          return Ok(Err(JoinRejection::RoomGone(room_id)));
        };
        if room.members.contains(&user_str) {
          return Ok(Err(JoinRejection::AlreadyMember(room_id)));
        }
        if room.members.len() >= ROOM_CAPACITY {
          return Ok(Err(JoinRejection::Full(room_id)));
        }

        tx.execute(
          "INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![room_id, user_str, at],
        )?;
        tx.execute(
          "INSERT INTO user_rooms (user_id, room_id) VALUES (?1, ?2)
           ON CONFLICT (user_id) DO UPDATE SET room_id = excluded.room_id",
          rusqlite::params![user_str, room_id],
        )?;
        tx.commit()?;

        room.members.push(user_str);
        Ok(Ok(room))
      })
      .await?;

    let rejection = match outcome {
      Ok(raw) => {
        let room = raw.into_room()?;
        tracing::info!(room_id = %room.room_id, %user, "room joined");
        return Ok(room);
      }
      Err(rejection) => rejection,
    };

    Err(match rejection {
      JoinRejection::CodeNotFound => duet_core::Error::InviteCodeNotFound(code.to_string()),
      JoinRejection::RoomGone(id) => duet_core::Error::RoomNoLongerExists(decode_uuid(&id)?),
      JoinRejection::AlreadyMember(id) => {
        duet_core::Error::AlreadyMember { room_id: decode_uuid(&id)?, user }
      }
      JoinRejection::Full(id) => duet_core::Error::RoomFull(decode_uuid(&id)?),
    }
    .into())
  }

  async fn get_room(&self, room_id: Uuid) -> Result<Option<Room>> {
    let id_str = encode_uuid(room_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_room(conn, &id_str)?))
      .await?;
    raw.map(RawRoom::into_room).transpose()
  }

  async fn room_for_user(&self, user: &UserId) -> Result<Option<Uuid>> {
    let user_str = user.as_str().to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT room_id FROM user_rooms WHERE user_id = ?1",
              rusqlite::params![user_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.as_deref().map(decode_uuid).transpose()
  }

  async fn leave_room(&self, user: UserId, room_id: Uuid) -> Result<()> {
    let id_str   = encode_uuid(room_id);
    let user_str = user.as_str().to_owned();

    let room_deleted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "DELETE FROM room_members WHERE room_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str],
        )?;
        tx.execute(
          "DELETE FROM user_rooms WHERE user_id = ?1 AND room_id = ?2",
          rusqlite::params![user_str, id_str],
        )?;
        let remaining: i64 = tx.query_row(
          "SELECT COUNT(*) FROM room_members WHERE room_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        let deleted = remaining == 0
          && tx.execute("DELETE FROM rooms WHERE room_id = ?1", rusqlite::params![id_str])? > 0;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;

    tracing::info!(%room_id, %user, room_deleted, "room left");
    Ok(())
  }

  // ── Decision log ──────────────────────────────────────────────────────────

  async fn record_decision(&self, decision: Decision) -> Result<RecordedDecision> {
    let at = encode_ts(decision.decided_at)?;
    let room_str = encode_uuid(decision.room_id);
    let user_str = decision.user_id.as_str().to_owned();
    let item_id  = decision.item_id;
    let verdict  = decision.verdict.as_str();
    let is_like  = decision.verdict.is_like();
    let now      = encode_ts(Utc::now())?;

    let evaluation: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          &format!(
            "INSERT INTO decisions (room_id, item_id, user_id, verdict, decided_at, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ({NEXT_SEQ}))
             ON CONFLICT (room_id, item_id, user_id) DO UPDATE SET
               verdict    = excluded.verdict,
               decided_at = excluded.decided_at,
               seq        = excluded.seq"
          ),
          rusqlite::params![room_str, item_id, user_str, verdict, at],
        )?;
        let evaluation = if is_like {
          tx.execute(
            "INSERT INTO pending_evaluations (room_id, item_id, enqueued_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![room_str, item_id, now],
          )?;
          Some(tx.last_insert_rowid())
        } else {
          None
        };
        tx.commit()?;
        Ok(evaluation)
      })
      .await?;

    self.feed.publish(&decision);
    Ok(RecordedDecision { decision, evaluation })
  }

  async fn decisions_for_item(&self, room_id: Uuid, item_id: ItemId) -> Result<Vec<Decision>> {
    let room_str = encode_uuid(room_id);
    let raws: Vec<RawDecision> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM decisions WHERE room_id = ?1 AND item_id = ?2",
          RawDecision::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![room_str, item_id], RawDecision::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDecision::into_decision).collect()
  }

  async fn decisions_for_user(&self, room_id: Uuid, user: &UserId) -> Result<Vec<Decision>> {
    let room_str = encode_uuid(room_id);
    let user_str = user.as_str().to_owned();
    let raws: Vec<RawDecision> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM decisions WHERE room_id = ?1 AND user_id = ?2
           ORDER BY decided_at, seq",
          RawDecision::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![room_str, user_str], RawDecision::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDecision::into_decision).collect()
  }

  async fn undo_last_decision(&self, room_id: Uuid, user: &UserId) -> Result<UndoOutcome> {
    let room_str = encode_uuid(room_id);
    let user_str = user.as_str().to_owned();
    let (raw, match_removed): (Option<RawDecision>, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let latest = tx
          .query_row(
            &format!(
              "SELECT {} FROM decisions WHERE room_id = ?1 AND user_id = ?2
               ORDER BY decided_at DESC, seq DESC LIMIT 1",
              RawDecision::COLUMNS
            ),
            rusqlite::params![room_str, user_str],
            RawDecision::from_row,
          )
          .optional()?;
        let mut match_removed = false;
        if let Some(d) = &latest {
          tx.execute(
            "DELETE FROM decisions WHERE room_id = ?1 AND item_id = ?2 AND user_id = ?3",
            rusqlite::params![d.room_id, d.item_id, d.user_id],
          )?;
          match_removed = rollback_on_undo(&tx, &d.room_id, d.item_id, &d.verdict)?;
        }
        tx.commit()?;
        Ok((latest, match_removed))
      })
      .await?;
    let undone = raw.map(RawDecision::into_decision).transpose()?;
    Ok(UndoOutcome { undone, match_removed })
  }

  fn subscribe_decisions(&self, room_id: Uuid, partner: UserId) -> DecisionSubscription {
    self.feed.subscribe(room_id, partner)
  }

  // ── Matches ───────────────────────────────────────────────────────────────

  async fn get_match(&self, room_id: Uuid, item_id: ItemId) -> Result<Option<Match>> {
    let room_str = encode_uuid(room_id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_match(conn, &room_str, item_id)?))
      .await?;
    raw.map(RawMatch::into_match).transpose()
  }

  async fn list_matches(&self, room_id: Uuid) -> Result<Vec<Match>> {
    let room_str = encode_uuid(room_id);
    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM matches WHERE room_id = ?1 ORDER BY created_at DESC, item_id",
          RawMatch::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![room_str], RawMatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMatch::into_match).collect()
  }

  async fn create_match_if_absent(
    &self,
    room_id: Uuid,
    item_id: ItemId,
    now:     DateTime<Utc>,
  ) -> Result<MatchCreation> {
    let room_str = encode_uuid(room_id);
    let at       = encode_ts(now)?;

    let raw: RawCreation = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if select_match(&tx, &room_str, item_id)?.is_some() {
          return Ok(RawCreation::AlreadyMatched);
        }
        // Only likes from current members count.
        let likes: i64 = tx.query_row(
          "SELECT COUNT(*) FROM decisions d
           JOIN room_members m ON m.room_id = d.room_id AND m.user_id = d.user_id
           WHERE d.room_id = ?1 AND d.item_id = ?2 AND d.verdict = 'like'",
          rusqlite::params![room_str, item_id],
          |row| row.get(0),
        )?;
        if likes < LIKES_FOR_MATCH {
          return Ok(RawCreation::NotEnoughLikes);
        }

        tx.execute(
          "INSERT INTO matches (room_id, item_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![room_str, item_id, at],
        )?;
        let members = select_members(&tx, &room_str)?;
        tx.commit()?;

        Ok(RawCreation::Created(
          RawMatch { room_id: room_str, item_id, created_at: at, watched: false, notes: String::new() },
          members,
        ))
      })
      .await?;

    Ok(match raw {
      RawCreation::Created(record, members) => MatchCreation::Created {
        record:  record.into_match()?,
        members: members.into_iter().map(decode_user).collect::<Result<_>>()?,
      },
      RawCreation::AlreadyMatched => MatchCreation::AlreadyMatched,
      RawCreation::NotEnoughLikes => MatchCreation::NotEnoughLikes,
    })
  }

  async fn delete_match(&self, room_id: Uuid, item_id: ItemId) -> Result<bool> {
    let room_str = encode_uuid(room_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM matches WHERE room_id = ?1 AND item_id = ?2",
          rusqlite::params![room_str, item_id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn mark_watched(&self, room_id: Uuid, item_id: ItemId, notes: String) -> Result<Match> {
    let room_str = encode_uuid(room_id);
    let raw: Option<RawMatch> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "UPDATE matches SET watched = 1, notes = ?3 WHERE room_id = ?1 AND item_id = ?2",
          rusqlite::params![room_str, item_id, notes],
        )?;
        let raw = select_match(&tx, &room_str, item_id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;
    raw
      .ok_or(duet_core::Error::MatchNotFound { room_id, item_id })?
      .into_match()
  }

  // ── Pending evaluations ───────────────────────────────────────────────────

  async fn pending_evaluations(&self, limit: usize) -> Result<Vec<PendingEvaluation>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let raws: Vec<RawPending> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT evaluation_id, room_id, item_id, enqueued_at
           FROM pending_evaluations ORDER BY evaluation_id LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawPending {
              evaluation_id: row.get(0)?,
              room_id:       row.get(1)?,
              item_id:       row.get(2)?,
              enqueued_at:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawPending::into_pending).collect()
  }

  async fn ack_evaluation(&self, evaluation_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM pending_evaluations WHERE evaluation_id = ?1",
          rusqlite::params![evaluation_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Retention ─────────────────────────────────────────────────────────────

  async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<PurgeReport> {
    let cutoff = encode_ts(cutoff)?;
    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let decisions = tx.execute(
          "DELETE FROM decisions WHERE decided_at < ?1",
          rusqlite::params![cutoff],
        )?;
        let matches = tx.execute(
          &format!("DELETE FROM matches WHERE created_at < ?1 AND {NOT_RETAINED}"),
          rusqlite::params![cutoff],
        )?;
        tx.commit()?;
        Ok(PurgeReport { decisions, matches })
      })
      .await?;
    Ok(report)
  }

  async fn delete_user_decisions(&self, room_id: Uuid, user: &UserId) -> Result<PurgeReport> {
    let room_str = encode_uuid(room_id);
    let user_str = user.as_str().to_owned();
    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let liked: Vec<i64> = {
          let mut stmt = tx.prepare(
            "SELECT item_id FROM decisions
             WHERE room_id = ?1 AND user_id = ?2 AND verdict = 'like'",
          )?;
          stmt
            .query_map(rusqlite::params![room_str, user_str], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?
        };

        let decisions = tx.execute(
          "DELETE FROM decisions WHERE room_id = ?1 AND user_id = ?2",
          rusqlite::params![room_str, user_str],
        )?;

        let mut matches = 0;
        for item_id in liked {
          if count_likes(&tx, &room_str, item_id)? < LIKES_FOR_MATCH {
            matches += tx.execute(
              &format!("DELETE FROM matches WHERE room_id = ?1 AND item_id = ?2 AND {NOT_RETAINED}"),
              rusqlite::params![room_str, item_id],
            )?;
          }
        }

        tx.commit()?;
        Ok(PurgeReport { decisions, matches })
      })
      .await?;
    Ok(report)
  }
}
