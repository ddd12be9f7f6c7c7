//! Client configuration.
//!
//! Every client owns its own [`ClientConfig`]; there is no process-wide base
//! URL or token.

use std::{fmt, time::Duration};

use crate::{ClientError, Result};

/// Versioned graph root used when no override is given.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v6.0";

/// Environment variable conventionally holding the access token.
pub const DEFAULT_TOKEN_ENV: &str = "TX_ACCESS_TOKEN";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How reads react to server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first.
  pub max_attempts: usize,
  /// Pause between attempts. Zero unless explicitly configured.
  pub backoff:      Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 5, backoff: Duration::ZERO }
  }
}

/// Connection settings for one client.
#[derive(Clone)]
pub struct ClientConfig {
  pub base_url:     String,
  pub access_token: String,
  pub timeout:      Duration,
  pub retry:        RetryPolicy,
}

impl ClientConfig {
  pub fn new(access_token: impl Into<String>) -> Self {
    Self {
      base_url:     DEFAULT_BASE_URL.to_string(),
      access_token: access_token.into(),
      timeout:      DEFAULT_TIMEOUT,
      retry:        RetryPolicy::default(),
    }
  }

  /// Read the access token from the environment variable `var`.
  pub fn from_env(var: &str) -> Result<Self> {
    let token = std::env::var(var)
      .map_err(|_| ClientError::MissingCredential(var.to_string()))?;
    Ok(Self::new(token))
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }
}

impl fmt::Debug for ClientConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ClientConfig")
      .field("base_url", &self.base_url)
      .field("access_token", &"<redacted>")
      .field("timeout", &self.timeout)
      .field("retry", &self.retry)
      .finish()
  }
}
