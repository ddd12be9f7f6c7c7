//! Async client for the threat-exchange graph API.
//!
//! Wraps [`reqwest`] with the read / write conventions of the graph
//! endpoints: the access token travels as a query parameter, reads retry on
//! server errors, listings follow `paging.next` cursors and writes report
//! failures as values rather than errors.
//!
//! Requests are issued one at a time; nothing here runs concurrently.

pub mod config;
pub mod error;
pub mod fetch;
pub mod mutate;
pub mod paginate;
pub mod query;

use reqwest::Client;
use url::Url;

pub use config::{ClientConfig, RetryPolicy};
pub use error::{ClientError, Result, TransportError};
pub use mutate::{MutationResult, WriteOptions};
pub use paginate::{Page, Paginator, QueryOptions};

/// HTTP client for one credential and base URL.
///
/// Clones share one connection pool.
#[derive(Clone)]
pub struct ThreatExchangeClient {
  http:   Client,
  config: ClientConfig,
}

impl ThreatExchangeClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, config })
  }

  pub fn config(&self) -> &ClientConfig { &self.config }

  /// `{base}/{segments…}/?access_token=…`
  ///
  /// Segments are percent-encoded, so ids supplied by callers cannot alter
  /// the path or query.
  pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.config.base_url)?;
    url
      .path_segments_mut()
      .map_err(|()| ClientError::InvalidBaseUrl(self.config.base_url.clone()))?
      .pop_if_empty()
      .extend(segments)
      .push("");
    url
      .query_pairs_mut()
      .append_pair("access_token", &self.config.access_token);
    Ok(url)
  }
}
