//! Error types for `finds-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown entity type {0:?}; add it to the entity registry")]
  UnknownEntityType(String),

  #[error("candidate field {field:?} is invalid: {reason}")]
  InvalidField { field: String, reason: String },

  #[error("candidate record must be a JSON object")]
  NotAnObject,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether the error condemns only the offending source document.
  ///
  /// A recoverable error discards one candidate; other candidates for the
  /// same entity may still be merged, and the stored record is untouched.
  pub fn is_recoverable(&self) -> bool {
    matches!(self, Self::InvalidField { .. } | Self::NotAnObject)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
