//! Payload shaping for copying a descriptor.
//!
//! A copy is a submit whose fields are seeded from an existing descriptor.
//! The read-side shape differs from what the create endpoint accepts, so the
//! source is reshaped before the caller's fields are laid over it.

use serde_json::Value;

use crate::{
  Error, Result,
  descriptor::Descriptor,
  post_param::{PostParam, PostParams, render_value},
};

/// Build submit fields for a copy of `source`.
///
/// `raw_indicator` becomes `indicator`, reactions are dropped (owner →
/// reaction maps cannot be posted), null or empty tags are dropped, and only
/// recognised post parameters survive. Every field in `overrides` replaces
/// the copied value, except `descriptor_id`, which names the source and is
/// never carried onto the new record.
pub fn build_copy_params(
  source: &Descriptor,
  overrides: &PostParams,
) -> Result<PostParams> {
  let Value::Object(mut fields) = serde_json::to_value(source)? else {
    return Err(Error::MalformedDescriptor(format!(
      "descriptor {} did not serialize to an object",
      source.id
    )));
  };

  if let Some(indicator) = fields.remove("raw_indicator") {
    fields.insert(PostParam::Indicator.as_str().to_string(), indicator);
  }
  fields.remove("reactions");
  match fields.get("tags") {
    Some(Value::Null) => {
      fields.remove("tags");
    }
    Some(Value::Array(tags)) if tags.is_empty() => {
      fields.remove("tags");
    }
    _ => {}
  }

  let mut params: PostParams = fields
    .iter()
    .filter_map(|(key, value)| {
      let param = key.parse::<PostParam>().ok()?;
      Some((param, render_value(value)?))
    })
    .collect();

  params.extend(
    overrides
      .iter()
      .filter(|(param, _)| *param != PostParam::DescriptorId)
      .map(|(param, value)| (param, value.to_string())),
  );
  params.remove(PostParam::DescriptorId);

  Ok(params)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::descriptor::normalize;

  fn source() -> Descriptor {
    normalize(
      json!({
        "id": "1234567890",
        "raw_indicator": "abc",
        "type": "HASH_MD5",
        "added_on": "2020-05-01T07:02:25+0000",
        "last_updated": "2020-05-02T07:02:25+0000",
        "owner": { "id": "42" },
        "share_level": "GREEN",
        "status": "MALICIOUS",
        "privacy_type": "VISIBLE",
        "confidence": 80,
        "description": "original",
        "reactions": { "42": "HELPFUL" },
        "tags": null,
      }),
      true,
    )
    .unwrap()
  }

  fn overrides() -> PostParams {
    let mut p = PostParams::new();
    p.insert(PostParam::DescriptorId, "1234567890");
    p.insert(PostParam::PrivacyType, "HAS_PRIVACY_GROUP");
    p.insert(PostParam::PrivacyMembers, "781588512307315");
    p.insert(PostParam::Description, "d");
    p
  }

  #[test]
  fn indicator_is_renamed() {
    let p = build_copy_params(&source(), &overrides()).unwrap();
    assert_eq!(p.get(PostParam::Indicator), Some("abc"));
  }

  #[test]
  fn reactions_and_null_tags_are_dropped() {
    let p = build_copy_params(&source(), &overrides()).unwrap();
    assert!(!p.contains(PostParam::Reactions));
    assert!(!p.contains(PostParam::Tags));
  }

  #[test]
  fn caller_fields_win() {
    let p = build_copy_params(&source(), &overrides()).unwrap();
    assert_eq!(p.get(PostParam::Description), Some("d"));
    assert_eq!(p.get(PostParam::PrivacyType), Some("HAS_PRIVACY_GROUP"));
    assert_eq!(p.get(PostParam::PrivacyMembers), Some("781588512307315"));
  }

  #[test]
  fn source_values_fill_the_rest() {
    let p = build_copy_params(&source(), &overrides()).unwrap();
    assert_eq!(p.get(PostParam::Type), Some("HASH_MD5"));
    assert_eq!(p.get(PostParam::ShareLevel), Some("GREEN"));
    assert_eq!(p.get(PostParam::Status), Some("MALICIOUS"));
    assert_eq!(p.get(PostParam::Confidence), Some("80"));
  }

  #[test]
  fn source_id_and_read_only_fields_are_not_carried() {
    let p = build_copy_params(&source(), &overrides()).unwrap();
    assert!(!p.contains(PostParam::DescriptorId));
    assert!(p.iter().all(|(_, v)| v != "1234567890"));
    let names: Vec<_> = p.iter().map(|(k, _)| k.as_str()).collect();
    assert!(!names.contains(&"added_on"));
    assert!(!names.contains(&"owner"));
  }

  #[test]
  fn present_tags_are_joined() {
    let mut d = source();
    d.tags = vec!["a".into(), "b".into()];
    let p = build_copy_params(&d, &overrides()).unwrap();
    assert_eq!(p.get(PostParam::Tags), Some("a,b"));
  }

  #[test]
  fn copy_of_a_copy_satisfies_submit() {
    use crate::validate::{MutationKind, validate};
    let p = build_copy_params(&source(), &overrides()).unwrap();
    assert_eq!(validate(MutationKind::Submit, &p), Ok(()));
  }
}
