//! Threat descriptors and the items that point at them.
//!
//! The graph API hands back descriptors in a loosely-shaped form: tags are
//! wrapped in a `{ "data": [...] }` envelope, `description` may be null and
//! the indicator is sometimes unwanted in output. [`normalize`] turns one raw
//! item into the canonical [`Descriptor`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Declared `type` of tagged objects that are threat descriptors.
pub const THREAT_DESCRIPTOR: &str = "THREAT_DESCRIPTOR";

/// Fields requested whenever full descriptors are fetched.
pub const DESCRIPTOR_FIELDS: &str = "raw_indicator,type,added_on,last_updated,\
                                     confidence,owner,privacy_type,\
                                     review_status,status,severity,\
                                     share_level,tags,description,reactions,\
                                     my_reactions";

// ─── Descriptor ──────────────────────────────────────────────────────────────

/// The app that owns a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
  pub id:    String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

/// One normalized threat descriptor.
///
/// `tags` is always present and sorted; `description` is never null. Fields
/// the server sends that are not modelled here are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
  pub id: String,

  /// Absent when the indicator was excluded from output.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub raw_indicator: Option<String>,

  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub indicator_type: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub added_on: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub confidence: Option<i64>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub owner: Option<Owner>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub privacy_type: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub review_status: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub severity: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub share_level: Option<String>,

  #[serde(default)]
  pub tags: Vec<String>,

  #[serde(default)]
  pub description: String,

  /// Read-side shape: owner app → reaction. Not postable as-is.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reactions: Option<Value>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub my_reactions: Option<Value>,

  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

// ─── Pointers ────────────────────────────────────────────────────────────────

/// One entry from a tag's `tagged_objects` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedObject {
  pub id:          String,
  #[serde(rename = "type")]
  pub object_type: String,
  /// The indicator text; stripped when the indicator is excluded.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:        Option<String>,
}

impl TaggedObject {
  pub fn is_descriptor(&self) -> bool { self.object_type == THREAT_DESCRIPTOR }
}

/// A tag as returned by the tag lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
  pub id:   String,
  pub text: String,
}

// ─── Normalization ───────────────────────────────────────────────────────────

/// Reshape one raw descriptor item into a [`Descriptor`].
///
/// With `include_indicator` unset the `raw_indicator` field is dropped
/// entirely rather than nulled.
pub fn normalize(raw: Value, include_indicator: bool) -> Result<Descriptor> {
  let Value::Object(mut object) = raw else {
    return Err(Error::MalformedDescriptor(format!(
      "expected a JSON object, got {raw}"
    )));
  };
  if !object.contains_key("id") {
    return Err(Error::MalformedDescriptor("missing id".to_string()));
  }

  let tags = tag_texts(object.remove("tags"))?;
  object.insert("tags".to_string(), Value::from(tags));

  if matches!(object.get("description"), None | Some(Value::Null)) {
    object.insert("description".to_string(), Value::from(""));
  }

  if !include_indicator {
    object.remove("raw_indicator");
  }

  Ok(serde_json::from_value(Value::Object(object))?)
}

/// Flatten a tag collection to sorted tag texts.
///
/// Accepts the server envelope (`{"data": [{"text": ...}]}`) as well as an
/// already-flattened list, so normalization is idempotent.
fn tag_texts(tags: Option<Value>) -> Result<Vec<String>> {
  let items = match tags {
    None | Some(Value::Null) => return Ok(Vec::new()),
    Some(Value::Object(mut envelope)) => match envelope.remove("data") {
      Some(Value::Array(items)) => items,
      None | Some(Value::Null) => Vec::new(),
      Some(other) => {
        return Err(Error::MalformedDescriptor(format!(
          "tags.data is not a list: {other}"
        )));
      }
    },
    Some(Value::Array(items)) => items,
    Some(other) => {
      return Err(Error::MalformedDescriptor(format!(
        "unexpected tags value: {other}"
      )));
    }
  };

  let mut texts = items
    .into_iter()
    .map(|item| match item {
      Value::String(text) => Ok(text),
      Value::Object(mut tag) => match tag.remove("text") {
        Some(Value::String(text)) => Ok(text),
        _ => Err(Error::MalformedDescriptor("tag without text".to_string())),
      },
      other => Err(Error::MalformedDescriptor(format!(
        "unexpected tag entry: {other}"
      ))),
    })
    .collect::<Result<Vec<_>>>()?;
  texts.sort();
  Ok(texts)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn raw() -> Value {
    json!({
      "id": "4036655176350945",
      "raw_indicator": "evil.example.com",
      "type": "DOMAIN",
      "added_on": "2020-05-01T07:02:25+0000",
      "confidence": 50,
      "owner": { "id": "494491891138576", "name": "Example App" },
      "share_level": "AMBER",
      "status": "MALICIOUS",
      "tags": {
        "data": [
          { "id": "2", "text": "phishing" },
          { "id": "1", "text": "botnet" },
          { "id": "3", "text": "phishing" },
        ]
      },
      "description": null,
      "reactions": { "494491891138576": "HELPFUL" },
    })
  }

  #[test]
  fn tags_are_flattened_and_sorted() {
    let d = normalize(raw(), true).unwrap();
    assert_eq!(d.tags, vec!["botnet", "phishing", "phishing"]);
  }

  #[test]
  fn missing_tags_become_empty_list() {
    let d = normalize(json!({ "id": "1" }), true).unwrap();
    assert!(d.tags.is_empty());
    let d = normalize(json!({ "id": "1", "tags": null }), true).unwrap();
    assert!(d.tags.is_empty());
  }

  #[test]
  fn null_or_missing_description_becomes_empty() {
    let d = normalize(raw(), true).unwrap();
    assert_eq!(d.description, "");
    let d = normalize(json!({ "id": "1" }), true).unwrap();
    assert_eq!(d.description, "");
  }

  #[test]
  fn excluded_indicator_is_removed_not_nulled() {
    let d = normalize(raw(), false).unwrap();
    assert!(d.raw_indicator.is_none());
    let out = serde_json::to_value(&d).unwrap();
    assert!(out.get("raw_indicator").is_none());
  }

  #[test]
  fn typed_fields_are_populated() {
    let d = normalize(raw(), true).unwrap();
    assert_eq!(d.raw_indicator.as_deref(), Some("evil.example.com"));
    assert_eq!(d.indicator_type.as_deref(), Some("DOMAIN"));
    assert_eq!(d.confidence, Some(50));
    assert_eq!(d.owner.as_ref().map(|o| o.id.as_str()), Some("494491891138576"));
    assert!(d.reactions.is_some());
  }

  #[test]
  fn unmodelled_fields_are_kept() {
    let mut item = raw();
    item["precision"] = json!("HIGH");
    let d = normalize(item, true).unwrap();
    assert_eq!(d.extra.get("precision"), Some(&json!("HIGH")));
  }

  #[test]
  fn normalizing_twice_is_stable() {
    let once = normalize(raw(), true).unwrap();
    let twice = normalize(serde_json::to_value(&once).unwrap(), true).unwrap();
    assert_eq!(once, twice);
  }

  #[test]
  fn non_object_is_rejected() {
    let r = normalize(json!(["not", "a", "descriptor"]), true);
    assert!(matches!(r, Err(Error::MalformedDescriptor(_))));
  }

  #[test]
  fn missing_id_is_rejected() {
    let r = normalize(json!({ "raw_indicator": "x" }), true);
    assert!(matches!(r, Err(Error::MalformedDescriptor(_))));
  }

  #[test]
  fn tagged_object_recognises_descriptors() {
    let item: TaggedObject = serde_json::from_value(json!({
      "id": "9915337796604770",
      "type": "THREAT_DESCRIPTOR",
      "name": "7ef5aa97",
    }))
    .unwrap();
    assert!(item.is_descriptor());
  }
}
