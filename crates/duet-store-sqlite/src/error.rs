//! Error type for `duet-store-sqlite`.

use chrono::{DateTime, Utc};
use duet_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] duet_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("timestamp outside the storable range: {0}")]
  Timestamp(DateTime<Utc>),

  #[error("corrupt row: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn domain(&self) -> Option<&duet_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
