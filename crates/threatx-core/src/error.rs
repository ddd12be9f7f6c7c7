//! Error types for `threatx-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Malformed descriptor ID \"{0}\"")]
  MalformedDescriptorId(String),

  #[error("malformed descriptor: {0}")]
  MalformedDescriptor(String),

  #[error("unknown post parameter: {0:?}")]
  UnknownPostParam(String),

  #[error("expected NAME=VALUE, got {0:?}")]
  MalformedAssignment(String),

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
