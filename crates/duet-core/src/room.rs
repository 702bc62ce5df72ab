//! Rooms, their members, and the invite codes that lead into them.
//!
//! A room pairs exactly two users. It is created by one user, who receives an
//! invite code to hand to the partner; the partner joins with that code.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Maximum number of members in a room.
pub const ROOM_CAPACITY: usize = 2;

/// Opaque user identifier issued by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  /// Wrap an identity-provider id, rejecting empty strings.
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      return Err(Error::EmptyUserId);
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// A pairing context of at most [`ROOM_CAPACITY`] users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
  pub room_id:    Uuid,
  /// Member ids in join order. Never longer than [`ROOM_CAPACITY`].
  pub members:    Vec<UserId>,
  pub created_at: DateTime<Utc>,
}

impl Room {
  pub fn is_member(&self, user: &UserId) -> bool { self.members.contains(user) }

  pub fn is_full(&self) -> bool { self.members.len() >= ROOM_CAPACITY }

  /// The other member of the room, if `user` is a member and has a partner.
  pub fn partner_of(&self, user: &UserId) -> Option<&UserId> {
    if !self.is_member(user) {
      return None;
    }
    self.members.iter().find(|m| *m != user)
  }

  /// Fail with [`Error::NotAMember`] unless `user` belongs to this room.
  pub fn ensure_member(&self, user: &UserId) -> Result<()> {
    if self.is_member(user) {
      Ok(())
    } else {
      Err(Error::NotAMember { room_id: self.room_id, user: user.clone() })
    }
  }
}

// ─── Invite codes ────────────────────────────────────────────────────────────

const CONSONANTS: &[u8] = b"BCDFGHJKLMNPRSTVWXZ";
const VOWELS: &[u8] = b"AEIOUY";
const SEPARATOR: char = '-';
const BLOCK_LEN: usize = 3;
const CODE_LEN: usize = BLOCK_LEN * 2 + 1;

/// Bound on generation attempts before [`Error::InviteCodeExhausted`].
pub const INVITE_CODE_ATTEMPTS: usize = 10;

/// A short, speakable code such as `BAK-TOF`.
///
/// Each block is consonant-vowel-consonant. The two alphabets are disjoint,
/// so a code can be read aloud without ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InviteCode(String);

impl InviteCode {
  /// Validate and normalise user input. Surrounding whitespace is ignored and
  /// lowercase letters are accepted.
  pub fn parse(input: &str) -> Result<Self> {
    let normalised = input.trim().to_ascii_uppercase();
    if is_well_formed(&normalised) {
      Ok(Self(normalised))
    } else {
      Err(Error::InvalidInviteCode(input.to_owned()))
    }
  }

  /// Draw a fresh random code. Collision checks are the store's job.
  pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
    let mut code = String::with_capacity(CODE_LEN);
    for block in 0..2 {
      if block == 1 {
        code.push(SEPARATOR);
      }
      code.push(pick(rng, CONSONANTS));
      code.push(pick(rng, VOWELS));
      code.push(pick(rng, CONSONANTS));
    }
    Self(code)
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8]) -> char {
  alphabet[rng.random_range(0..alphabet.len())] as char
}

fn is_well_formed(code: &str) -> bool {
  let bytes = code.as_bytes();
  if bytes.len() != CODE_LEN || bytes[BLOCK_LEN] != SEPARATOR as u8 {
    return false;
  }
  bytes[..BLOCK_LEN]
    .iter()
    .chain(&bytes[BLOCK_LEN + 1..])
    .enumerate()
    .all(|(i, b)| match i % BLOCK_LEN {
      1 => VOWELS.contains(b),
      _ => CONSONANTS.contains(b),
    })
}

impl TryFrom<String> for InviteCode {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<InviteCode> for String {
  fn from(code: InviteCode) -> Self { code.0 }
}

impl fmt::Display for InviteCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Result of `create_room`: the new room and the code that leads into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedRoom {
  pub room:        Room,
  pub invite_code: InviteCode,
}
