//! Idempotent reads with bounded retry on server errors.

use reqwest::Response;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{Result, ThreatExchangeClient, TransportError};

impl ThreatExchangeClient {
  /// GET `url` and decode the body as JSON.
  ///
  /// A 5xx response is retried, up to [`RetryPolicy::max_attempts`] attempts
  /// in total; any other non-2xx status fails at once. A 2xx body that is not
  /// UTF-8 JSON is an error and is not retried.
  ///
  /// [`RetryPolicy::max_attempts`]: crate::RetryPolicy::max_attempts
  pub async fn fetch_json(&self, url: &Url) -> Result<Value> {
    let retry = self.config.retry;
    let attempts = retry.max_attempts.max(1);
    let mut attempt = 0;

    loop {
      attempt += 1;
      debug!(attempt, url = %redact(url), "GET");

      let response = self.http.get(url.clone()).send().await?;
      let status = response.status();
      if status.is_success() {
        return read_json(response).await;
      }

      let error = transport_error(url, response).await;
      if !status.is_server_error() || attempt >= attempts {
        return Err(error.into());
      }

      warn!(attempt, %status, url = %error.url, "server error, retrying");
      if !retry.backoff.is_zero() {
        tokio::time::sleep(retry.backoff).await;
      }
    }
  }
}

/// Decode a response body as UTF-8 text, then JSON.
pub(crate) async fn read_json(response: Response) -> Result<Value> {
  let bytes = response.bytes().await?;
  let text = String::from_utf8(bytes.to_vec())?;
  Ok(serde_json::from_str(&text)?)
}

/// Capture a failed response, keeping whatever body the server sent.
pub(crate) async fn transport_error(
  url: &Url,
  response: Response,
) -> TransportError {
  let status = response.status();
  let body = match response.text().await {
    Ok(text) if text.is_empty() => None,
    Ok(text) => Some(serde_json::from_str(&text).unwrap_or(Value::String(text))),
    Err(_) => None,
  };
  TransportError { status, url: redact(url), body }
}

/// Render `url` with its access token hidden.
pub fn redact(url: &Url) -> String {
  if !url.query_pairs().any(|(k, _)| k == "access_token") {
    return url.to_string();
  }
  let pairs: Vec<(String, String)> = url
    .query_pairs()
    .map(|(k, v)| {
      let v = if k == "access_token" { "REDACTED".into() } else { v };
      (k.into_owned(), v.into_owned())
    })
    .collect();
  let mut redacted = url.clone();
  redacted.query_pairs_mut().clear().extend_pairs(pairs);
  redacted.to_string()
}
