//! Error types for `threatx-client`.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("${0} not found in environment.")]
  MissingCredential(String),

  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("response body is not UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),

  #[error("response body is not JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unexpected response shape: {0}")]
  UnexpectedShape(String),

  #[error("descriptor {0} not found")]
  DescriptorNotFound(String),

  #[error("invalid url: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("base url cannot carry a path: {0}")]
  InvalidBaseUrl(String),

  #[error(transparent)]
  Core(#[from] threatx_core::Error),
}

/// A non-2xx response.
#[derive(Debug, Error)]
#[error("HTTP {status} from {url}")]
pub struct TransportError {
  pub status: StatusCode,
  /// Request URL with the access token redacted.
  pub url:    String,
  /// Error body, parsed as JSON when possible, else kept as a JSON string.
  pub body:   Option<Value>,
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
