//! Cursor pagination over graph listings.
//!
//! A listing response looks like:
//!
//! ```json
//! {
//!   "data": [ { "id": "9915337796604770", "type": "THREAT_DESCRIPTOR" } ],
//!   "paging": {
//!     "cursors": { "before": "XYZIU…", "after": "XYZIUk…" },
//!     "next": "https://graph.facebook.com/v6.0/…/tagged_objects?after=…"
//!   }
//! }
//! ```
//!
//! The listing ends at the first response without `paging.next`. There is no
//! page ceiling; stop pulling from the [`Paginator`] (or drop the future) to
//! cancel.

use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::{ClientError, Result, ThreatExchangeClient, fetch::redact};

/// Options shared by the listing and lookup calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
  /// Page-size hint, sent with the first request only.
  pub page_size:                   u32,
  /// Epoch seconds; sent as `tagged_since`.
  pub tagged_since:                Option<i64>,
  /// Epoch seconds; sent as `tagged_until`.
  pub tagged_until:                Option<i64>,
  /// When unset, indicator text is removed from every item.
  pub include_indicator_in_output: bool,
  /// Log each item and per-page counts at `info`.
  pub verbose:                     bool,
  /// Log each request URL at `info`.
  pub show_urls:                   bool,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      page_size:                   10,
      tagged_since:                None,
      tagged_until:                None,
      include_indicator_in_output: true,
      verbose:                     false,
      show_urls:                   false,
    }
  }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
  /// Zero-based position in the listing.
  pub index: usize,
  /// Raw items, in server order.
  pub data:  Vec<Value>,
  /// Where the following page lives, if there is one.
  pub next:  Option<Url>,
}

/// Pull-based cursor over a listing.
pub struct Paginator<'a> {
  client:    &'a ThreatExchangeClient,
  next:      Option<Url>,
  index:     usize,
  show_urls: bool,
}

impl<'a> Paginator<'a> {
  pub fn new(client: &'a ThreatExchangeClient, start: Url) -> Self {
    Self { client, next: Some(start), index: 0, show_urls: false }
  }

  pub fn show_urls(mut self, show_urls: bool) -> Self {
    self.show_urls = show_urls;
    self
  }

  /// Fetch the next page, or `None` once the listing is exhausted.
  ///
  /// A failed fetch ends the listing.
  pub async fn next_page(&mut self) -> Result<Option<Page>> {
    let Some(url) = self.next.take() else {
      return Ok(None);
    };
    if self.show_urls {
      info!(page_index = self.index, url = %redact(&url), "fetching page");
    }

    let mut response = self.client.fetch_json(&url).await?;
    let data = match response.get_mut("data").map(Value::take) {
      Some(Value::Array(items)) => items,
      Some(other) => {
        return Err(ClientError::UnexpectedShape(format!(
          "`data` is not a list: {other}"
        )));
      }
      None => {
        return Err(ClientError::UnexpectedShape(
          "response has no `data`".to_string(),
        ));
      }
    };
    let next = response
      .pointer("/paging/next")
      .and_then(Value::as_str)
      .map(Url::parse)
      .transpose()?;

    debug!(
      page_index = self.index,
      items = data.len(),
      has_next = next.is_some(),
      "received page"
    );

    let page = Page { index: self.index, data, next: next.clone() };
    self.next = next;
    self.index += 1;
    Ok(Some(page))
  }
}
