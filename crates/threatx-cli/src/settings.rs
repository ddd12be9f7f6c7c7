//! Layered CLI settings: defaults, then an optional TOML file, then
//! `THREATX_*` environment variables. Command-line flags are applied last in
//! `main`.

use std::{path::Path, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;
use threatx_client::{
  ClientConfig, RetryPolicy,
  config::{DEFAULT_BASE_URL, DEFAULT_TOKEN_ENV},
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliSettings {
  pub base_url:         String,
  /// Name of the environment variable holding the access token.
  pub token_env:        String,
  pub page_size:        u32,
  pub timeout_secs:     u64,
  pub retry_attempts:   usize,
  pub retry_backoff_ms: u64,
}

impl Default for CliSettings {
  fn default() -> Self {
    let retry = RetryPolicy::default();
    Self {
      base_url:         DEFAULT_BASE_URL.to_string(),
      token_env:        DEFAULT_TOKEN_ENV.to_string(),
      page_size:        10,
      timeout_secs:     60,
      retry_attempts:   retry.max_attempts,
      retry_backoff_ms: 0,
    }
  }
}

impl CliSettings {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("THREATX").try_parsing(true))
      .build()
      .with_context(|| format!("failed to read settings from {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise CliSettings")
  }

  /// Build a client config, reading the token from `token_env`.
  pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
    let config = ClientConfig::from_env(&self.token_env)?
      .with_base_url(&self.base_url)
      .with_timeout(Duration::from_secs(self.timeout_secs))
      .with_retry(RetryPolicy {
        max_attempts: self.retry_attempts,
        backoff:      Duration::from_millis(self.retry_backoff_ms),
      });
    Ok(config)
  }
}
