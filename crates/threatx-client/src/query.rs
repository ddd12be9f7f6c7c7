//! Read endpoints: tag lookup, tagged objects, descriptor details and
//! descriptor search.

use serde_json::Value;
use threatx_core::{
  descriptor::{
    DESCRIPTOR_FIELDS, Descriptor, THREAT_DESCRIPTOR, TagRef, TaggedObject, normalize,
  },
  error::Error as CoreError,
};
use tracing::{debug, info};
use url::Url;

use crate::{
  ClientError, Page, Paginator, QueryOptions, Result, ThreatExchangeClient,
  fetch::redact,
};

impl ThreatExchangeClient {
  // ── Tags ──────────────────────────────────────────────────────────────────

  /// Look up the id of the tag whose text is exactly `name`.
  ///
  /// The server matches on prefix, so `media_type_video` also returns
  /// `media_type_video_long_hash`; only an exact match is accepted.
  pub async fn get_tag_id_from_name(
    &self,
    name: &str,
    show_urls: bool,
  ) -> Result<Option<String>> {
    let mut url = self.endpoint(&["threat_tags"])?;
    url.query_pairs_mut().append_pair("text", name);
    log_url(&url, show_urls);

    let mut response = self.fetch_json(&url).await?;
    let tags: Vec<TagRef> = match response.get_mut("data").map(Value::take) {
      Some(data) => serde_json::from_value(data)?,
      None => {
        return Err(ClientError::UnexpectedShape(
          "tag lookup response has no `data`".to_string(),
        ));
      }
    };
    Ok(tags.into_iter().find(|t| t.text == name).map(|t| t.id))
  }

  // ── Tagged objects ────────────────────────────────────────────────────────

  /// Paginator over the objects carrying tag `tag_id`.
  pub fn tagged_objects(
    &self,
    tag_id: &str,
    opts: &QueryOptions,
  ) -> Result<Paginator<'_>> {
    let mut url = self.endpoint(&[tag_id, "tagged_objects"])?;
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("limit", &opts.page_size.to_string());
      if let Some(since) = opts.tagged_since {
        query.append_pair("tagged_since", &since.to_string());
      }
      if let Some(until) = opts.tagged_until {
        query.append_pair("tagged_until", &until.to_string());
      }
    }
    Ok(Paginator::new(self, url).show_urls(opts.show_urls))
  }

  /// The threat descriptors on one tagged-objects page, in order.
  ///
  /// Items of any other type are dropped before they are decoded, whatever
  /// their shape. `name` is stripped when the indicator is excluded.
  pub fn tagged_descriptors(
    page: Page,
    opts: &QueryOptions,
  ) -> Result<Vec<TaggedObject>> {
    let total = page.data.len();
    let mut descriptors = Vec::with_capacity(total);
    for item in page.data {
      if item.get("type").and_then(Value::as_str) != Some(THREAT_DESCRIPTOR) {
        continue;
      }
      let mut item: TaggedObject = serde_json::from_value(item)?;
      if !opts.include_indicator_in_output {
        item.name = None;
      }
      if opts.verbose {
        info!(item = %serde_json::to_string(&item)?, "tagged object");
      }
      descriptors.push(item);
    }
    log_page_counts(page.index, total, descriptors.len(), opts.verbose);
    Ok(descriptors)
  }

  /// Ids of the threat descriptors on one tagged-objects page, in order.
  pub fn descriptor_ids(page: Page, opts: &QueryOptions) -> Result<Vec<String>> {
    Ok(
      Self::tagged_descriptors(page, opts)?
        .into_iter()
        .map(|item| item.id)
        .collect(),
    )
  }

  /// Walk every page of tag `tag_id`, handing each page's descriptor ids to
  /// `on_page`.
  pub async fn process_descriptor_ids_by_tag_id<F>(
    &self,
    tag_id: &str,
    opts: &QueryOptions,
    mut on_page: F,
  ) -> Result<()>
  where
    F: FnMut(Vec<String>),
  {
    let mut pages = self.tagged_objects(tag_id, opts)?;
    while let Some(page) = pages.next_page().await? {
      on_page(Self::descriptor_ids(page, opts)?);
    }
    Ok(())
  }

  // ── Descriptor details ────────────────────────────────────────────────────

  /// Fetch full descriptors for `ids`, returned in the order requested.
  ///
  /// Every id must be an integer string; this is checked before any request.
  /// Ids the server does not return are skipped.
  pub async fn get_info_for_ids<S: AsRef<str>>(
    &self,
    ids: &[S],
    opts: &QueryOptions,
  ) -> Result<Vec<Descriptor>> {
    for id in ids {
      let id = id.as_ref();
      if id.parse::<i64>().is_err() {
        return Err(CoreError::MalformedDescriptorId(id.to_string()).into());
      }
    }
    let joined = ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");

    let mut url = self.endpoint(&[])?;
    url
      .query_pairs_mut()
      .append_pair("ids", &joined)
      .append_pair("fields", DESCRIPTOR_FIELDS);
    log_url(&url, opts.show_urls);

    let mut response = self.fetch_json(&url).await?;
    let Some(by_id) = response.as_object_mut() else {
      return Err(ClientError::UnexpectedShape(
        "descriptor lookup did not return an object".to_string(),
      ));
    };

    let mut descriptors = Vec::with_capacity(ids.len());
    for id in ids {
      let Some(mut raw) = by_id.remove(id.as_ref()) else {
        debug!(id = id.as_ref(), "descriptor missing from response");
        continue;
      };
      // `fields` does not ask for `id`; the response key carries it.
      if let Some(node) = raw.as_object_mut() {
        node
          .entry("id")
          .or_insert_with(|| Value::from(id.as_ref()));
      }
      let descriptor = normalize(raw, opts.include_indicator_in_output)?;
      if opts.verbose {
        info!(descriptor = %serde_json::to_string(&descriptor)?, "descriptor");
      }
      descriptors.push(descriptor);
    }
    Ok(descriptors)
  }

  // ── Search ────────────────────────────────────────────────────────────────

  /// Paginator over `threat_descriptors` search results.
  ///
  /// The server is known not to paginate this endpoint reliably; prefer
  /// [`tagged_objects`](Self::tagged_objects) for complete listings.
  pub fn search_descriptors<K, V>(
    &self,
    params: &[(K, V)],
    opts: &QueryOptions,
  ) -> Result<Paginator<'_>>
  where
    K: AsRef<str>,
    V: AsRef<str>,
  {
    let mut url = self.endpoint(&["threat_descriptors"])?;
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("fields", DESCRIPTOR_FIELDS);
      for (key, value) in params {
        query.append_pair(key.as_ref(), value.as_ref());
      }
    }
    Ok(Paginator::new(self, url).show_urls(opts.show_urls))
  }

  /// Normalize every descriptor on one search page.
  pub fn descriptors(page: Page, opts: &QueryOptions) -> Result<Vec<Descriptor>> {
    let total = page.data.len();
    let descriptors = page
      .data
      .into_iter()
      .map(|raw| normalize(raw, opts.include_indicator_in_output))
      .collect::<Result<Vec<_>, _>>()?;
    log_page_counts(page.index, total, descriptors.len(), opts.verbose);
    Ok(descriptors)
  }

  /// Run a descriptor search, handing each normalized page to `on_page`.
  pub async fn power_search<K, V, F>(
    &self,
    params: &[(K, V)],
    opts: &QueryOptions,
    mut on_page: F,
  ) -> Result<()>
  where
    K: AsRef<str>,
    V: AsRef<str>,
    F: FnMut(Vec<Descriptor>),
  {
    let mut pages = self.search_descriptors(params, opts)?;
    while let Some(page) = pages.next_page().await? {
      on_page(Self::descriptors(page, opts)?);
    }
    Ok(())
  }
}

fn log_url(url: &Url, show_urls: bool) {
  if show_urls {
    info!(url = %redact(url), "request");
  }
}

fn log_page_counts(page_index: usize, before: usize, after: usize, verbose: bool) {
  if verbose {
    info!(page_index, num_items_pre_filter = before, num_items_post_filter = after, "page");
  } else {
    debug!(page_index, num_items_pre_filter = before, num_items_post_filter = after, "page");
  }
}
