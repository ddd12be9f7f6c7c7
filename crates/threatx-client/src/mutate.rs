//! Write endpoints: submit, update and copy descriptors.
//!
//! Writes never return `Err`. Each produces a [`MutationResult`] so a batch
//! of mutations can be inspected item by item and continue past failures.

use serde_json::Value;
use threatx_core::{
  mutation::build_copy_params,
  post_param::{PostParam, PostParams},
  validate::{MutationKind, ValidationError, validate},
};
use tracing::{debug, info};
use url::Url;

use crate::{
  ClientError, QueryOptions, ThreatExchangeClient,
  fetch::{read_json, redact, transport_error},
};

/// Options for a single write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
  /// Build and log the request, but do not send it.
  pub dry_run:   bool,
  pub show_urls: bool,
}

/// Outcome of a write.
///
/// At most one of the two errors is set. `body` is the server's response,
/// including the error body of a failed POST. It is `None` after a validation
/// failure or a dry run, and when no response arrived at all.
#[derive(Debug, Default)]
pub struct MutationResult {
  pub validation_error: Option<ValidationError>,
  pub transport_error:  Option<ClientError>,
  pub body:             Option<Value>,
}

impl MutationResult {
  fn invalid(error: ValidationError) -> Self {
    Self { validation_error: Some(error), ..Self::default() }
  }

  fn failed(error: ClientError, body: Option<Value>) -> Self {
    Self { transport_error: Some(error), body, ..Self::default() }
  }

  fn succeeded(body: Value) -> Self {
    Self { body: Some(body), ..Self::default() }
  }

  pub fn is_ok(&self) -> bool {
    self.validation_error.is_none() && self.transport_error.is_none()
  }
}

impl ThreatExchangeClient {
  /// Dispatch on `kind`.
  pub async fn mutate(
    &self,
    kind: MutationKind,
    params: &PostParams,
    opts: WriteOptions,
  ) -> MutationResult {
    match kind {
      MutationKind::Submit => self.submit_descriptor(params, opts).await,
      MutationKind::Update => self.update_descriptor(params, opts).await,
      MutationKind::Copy => self.copy_descriptor(params, opts).await,
    }
  }

  /// Create a new descriptor. `POST {base}/threat_descriptors/`
  pub async fn submit_descriptor(
    &self,
    params: &PostParams,
    opts: WriteOptions,
  ) -> MutationResult {
    if let Err(e) = validate(MutationKind::Submit, params) {
      return MutationResult::invalid(e);
    }
    match self.endpoint(&["threat_descriptors"]) {
      Ok(url) => self.post_descriptor(url, params, opts).await,
      Err(e) => MutationResult::failed(e, None),
    }
  }

  /// Edit an existing descriptor. `POST {base}/{descriptor_id}/`
  pub async fn update_descriptor(
    &self,
    params: &PostParams,
    opts: WriteOptions,
  ) -> MutationResult {
    if let Err(e) = validate(MutationKind::Update, params) {
      return MutationResult::invalid(e);
    }
    let Some(id) = params.get(PostParam::DescriptorId) else {
      return MutationResult::invalid(ValidationError::DescriptorIdRequired);
    };
    match self.endpoint(&[id]) {
      Ok(url) => self.post_descriptor(url, params, opts).await,
      Err(e) => MutationResult::failed(e, None),
    }
  }

  /// Submit a new descriptor seeded from `descriptor_id`.
  ///
  /// Fields in `params` override the copied ones; see
  /// [`build_copy_params`] for how the source is reshaped.
  pub async fn copy_descriptor(
    &self,
    params: &PostParams,
    opts: WriteOptions,
  ) -> MutationResult {
    if let Err(e) = validate(MutationKind::Copy, params) {
      return MutationResult::invalid(e);
    }
    let Some(source_id) = params.get(PostParam::DescriptorId) else {
      return MutationResult::invalid(ValidationError::SourceIdRequired);
    };

    let read_opts = QueryOptions { show_urls: opts.show_urls, ..QueryOptions::default() };
    let source = match self.get_info_for_ids(&[source_id], &read_opts).await {
      Ok(mut found) if !found.is_empty() => found.swap_remove(0),
      Ok(_) => {
        return MutationResult::failed(
          ClientError::DescriptorNotFound(source_id.to_string()),
          None,
        );
      }
      Err(e) => return MutationResult::failed(e, None),
    };

    match build_copy_params(&source, params) {
      Ok(submit) => self.submit_descriptor(&submit, opts).await,
      Err(e) => MutationResult::failed(e.into(), None),
    }
  }

  /// One POST with `params` both in the query string and form-encoded in the
  /// body. Never retried.
  async fn post_descriptor(
    &self,
    mut url: Url,
    params: &PostParams,
    opts: WriteOptions,
  ) -> MutationResult {
    let pairs = params.pairs();
    url.query_pairs_mut().extend_pairs(pairs.iter());

    if opts.show_urls || opts.dry_run {
      info!(url = %redact(&url), dry_run = opts.dry_run, "POST");
    }
    if opts.dry_run {
      return MutationResult::default();
    }

    let response = match self.http.post(url.clone()).form(&pairs).send().await {
      Ok(response) => response,
      Err(e) => return MutationResult::failed(e.into(), None),
    };
    let status = response.status();
    debug!(%status, url = %redact(&url), "POST response");

    if status.is_success() {
      match read_json(response).await {
        Ok(body) => MutationResult::succeeded(body),
        Err(e) => MutationResult::failed(e, None),
      }
    } else {
      let error = transport_error(&url, response).await;
      let body = error.body.clone();
      MutationResult::failed(error.into(), body)
    }
  }
}
