//! Write-side field names and the field map sent with a mutation.
//!
//! Only names in [`PostParam`] are accepted by the descriptor write
//! endpoints. [`PostParams`] keeps fields in a stable order so the query
//! string and form body of a request are reproducible.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── Names ───────────────────────────────────────────────────────────────────

/// A field accepted by the create / update descriptor endpoints.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PostParam {
  /// Submit only.
  Indicator,
  /// Submit only.
  Type,
  /// Update only; names the copy source for copy.
  DescriptorId,
  Description,
  ShareLevel,
  Status,
  PrivacyType,
  PrivacyMembers,
  Tags,
  AddTags,
  RemoveTags,
  Confidence,
  Precision,
  ReviewStatus,
  Severity,
  ExpiredOn,
  FirstActive,
  LastActive,
  RelatedIdsForUpload,
  RelatedTriplesForUploadAsJson,
  /// Reactions to add. The server never renamed this one.
  Reactions,
  ReactionsToRemove,
}

impl PostParam {
  pub const ALL: [PostParam; 22] = [
    PostParam::Indicator,
    PostParam::Type,
    PostParam::DescriptorId,
    PostParam::Description,
    PostParam::ShareLevel,
    PostParam::Status,
    PostParam::PrivacyType,
    PostParam::PrivacyMembers,
    PostParam::Tags,
    PostParam::AddTags,
    PostParam::RemoveTags,
    PostParam::Confidence,
    PostParam::Precision,
    PostParam::ReviewStatus,
    PostParam::Severity,
    PostParam::ExpiredOn,
    PostParam::FirstActive,
    PostParam::LastActive,
    PostParam::RelatedIdsForUpload,
    PostParam::RelatedTriplesForUploadAsJson,
    PostParam::Reactions,
    PostParam::ReactionsToRemove,
  ];

  /// The wire name of this field.
  pub fn as_str(self) -> &'static str {
    match self {
      PostParam::Indicator => "indicator",
      PostParam::Type => "type",
      PostParam::DescriptorId => "descriptor_id",
      PostParam::Description => "description",
      PostParam::ShareLevel => "share_level",
      PostParam::Status => "status",
      PostParam::PrivacyType => "privacy_type",
      PostParam::PrivacyMembers => "privacy_members",
      PostParam::Tags => "tags",
      PostParam::AddTags => "add_tags",
      PostParam::RemoveTags => "remove_tags",
      PostParam::Confidence => "confidence",
      PostParam::Precision => "precision",
      PostParam::ReviewStatus => "review_status",
      PostParam::Severity => "severity",
      PostParam::ExpiredOn => "expired_on",
      PostParam::FirstActive => "first_active",
      PostParam::LastActive => "last_active",
      PostParam::RelatedIdsForUpload => "related_ids_for_upload",
      PostParam::RelatedTriplesForUploadAsJson => {
        "related_triples_for_upload_as_json"
      }
      PostParam::Reactions => "reactions",
      PostParam::ReactionsToRemove => "reactions_to_remove",
    }
  }
}

impl fmt::Display for PostParam {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PostParam {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    PostParam::ALL
      .into_iter()
      .find(|p| p.as_str() == s)
      .ok_or_else(|| Error::UnknownPostParam(s.to_string()))
  }
}

// ─── Field map ───────────────────────────────────────────────────────────────

/// The fields of one create / update / copy request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostParams(BTreeMap<PostParam, String>);

impl PostParams {
  pub fn new() -> Self { Self::default() }

  /// Set `param`, returning the previous value if there was one.
  pub fn insert(
    &mut self,
    param: PostParam,
    value: impl Into<String>,
  ) -> Option<String> {
    self.0.insert(param, value.into())
  }

  pub fn get(&self, param: PostParam) -> Option<&str> {
    self.0.get(&param).map(String::as_str)
  }

  pub fn contains(&self, param: PostParam) -> bool { self.0.contains_key(&param) }

  pub fn remove(&mut self, param: PostParam) -> Option<String> {
    self.0.remove(&param)
  }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (PostParam, &str)> {
    self.0.iter().map(|(k, v)| (*k, v.as_str()))
  }

  /// `(name, value)` pairs, ready for a query string or form body.
  pub fn pairs(&self) -> Vec<(&'static str, &str)> {
    self.iter().map(|(k, v)| (k.as_str(), v)).collect()
  }

  /// Build from a JSON object, e.g. one line of batch input.
  ///
  /// Unknown keys are rejected; null values are skipped.
  pub fn from_json_object(object: &Map<String, Value>) -> Result<Self> {
    let mut params = PostParams::new();
    for (key, value) in object {
      let param: PostParam = key.parse()?;
      if let Some(rendered) = render_value(value) {
        params.insert(param, rendered);
      }
    }
    Ok(params)
  }

  /// Parse a `name=value` assignment as given on a command line.
  pub fn parse_assignment(s: &str) -> Result<(PostParam, String)> {
    let (name, value) = s
      .split_once('=')
      .ok_or_else(|| Error::MalformedAssignment(s.to_string()))?;
    Ok((name.trim().parse()?, value.to_string()))
  }
}

impl FromIterator<(PostParam, String)> for PostParams {
  fn from_iter<I: IntoIterator<Item = (PostParam, String)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl Extend<(PostParam, String)> for PostParams {
  fn extend<I: IntoIterator<Item = (PostParam, String)>>(&mut self, iter: I) {
    self.0.extend(iter);
  }
}

/// Render a JSON value the way the write endpoints expect it.
///
/// Strings pass through, scalars use their display form, arrays of scalars
/// become comma-separated lists and objects are sent as compact JSON. `null`
/// has no rendering.
pub fn render_value(value: &Value) -> Option<String> {
  match value {
    Value::Null => None,
    Value::String(s) => Some(s.clone()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Number(n) => Some(n.to_string()),
    Value::Array(items) => Some(
      items
        .iter()
        .filter_map(render_value)
        .collect::<Vec<_>>()
        .join(","),
    ),
    Value::Object(_) => Some(value.to_string()),
  }
}
