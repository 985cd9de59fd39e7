//! Error type for `finds-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] finds_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A listing row without its entity sub-record — the two are written in
  /// one transaction, so this indicates external tampering or corruption.
  #[error("entity sub-record missing for listing {0}")]
  MissingEntityRecord(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
