//! Client-side checks run before any write request is sent.
//!
//! These only look at which fields are present; value checking is left to
//! the server.

use std::fmt;

use thiserror::Error;

use crate::post_param::{PostParam, PostParams};

/// Which write a set of fields is shaped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  /// Create a new descriptor.
  Submit,
  /// Edit an existing descriptor by id.
  Update,
  /// Create a new descriptor seeded from an existing one.
  Copy,
}

impl fmt::Display for MutationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      MutationKind::Submit => "submit",
      MutationKind::Update => "update",
      MutationKind::Copy => "copy",
    })
  }
}

/// Fields a submit must carry.
pub const SUBMIT_REQUIRED: [PostParam; 6] = [
  PostParam::Indicator,
  PostParam::Type,
  PostParam::Description,
  PostParam::ShareLevel,
  PostParam::Status,
  PostParam::PrivacyType,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("descriptor_id must not be specified for submit.")]
  DescriptorIdForbidden,

  #[error("{}", missing_fields_message(.0))]
  MissingFields(Vec<PostParam>),

  #[error("Descriptor ID must be specified for update.")]
  DescriptorIdRequired,

  #[error("Indicator must not be specified for update.")]
  IndicatorImmutable,

  #[error("Type must not be specified for update.")]
  TypeImmutable,

  #[error("Source-descriptor ID must be specified for copy.")]
  SourceIdRequired,

  #[error("Privacy type must be specified for copy.")]
  PrivacyTypeRequired,

  #[error("Privacy members must be specified for copy.")]
  PrivacyMembersRequired,
}

fn missing_fields_message(fields: &[PostParam]) -> String {
  let names = fields
    .iter()
    .map(|f| f.as_str())
    .collect::<Vec<_>>()
    .join(",");
  if fields.len() == 1 {
    format!("Missing field {names}")
  } else {
    format!("Missing fields {names}")
  }
}

/// Check `params` against the shaping rules for `kind`.
pub fn validate(
  kind: MutationKind,
  params: &PostParams,
) -> Result<(), ValidationError> {
  match kind {
    MutationKind::Submit => validate_submit(params),
    MutationKind::Update => validate_update(params),
    MutationKind::Copy => validate_copy(params),
  }
}

fn validate_submit(params: &PostParams) -> Result<(), ValidationError> {
  if params.contains(PostParam::DescriptorId) {
    return Err(ValidationError::DescriptorIdForbidden);
  }
  let missing: Vec<PostParam> = SUBMIT_REQUIRED
    .into_iter()
    .filter(|p| !params.contains(*p))
    .collect();
  if missing.is_empty() {
    Ok(())
  } else {
    Err(ValidationError::MissingFields(missing))
  }
}

// An indicator is reported ahead of a type when both are present.
fn validate_update(params: &PostParams) -> Result<(), ValidationError> {
  if !params.contains(PostParam::DescriptorId) {
    return Err(ValidationError::DescriptorIdRequired);
  }
  if params.contains(PostParam::Indicator) {
    return Err(ValidationError::IndicatorImmutable);
  }
  if params.contains(PostParam::Type) {
    return Err(ValidationError::TypeImmutable);
  }
  Ok(())
}

fn validate_copy(params: &PostParams) -> Result<(), ValidationError> {
  if !params.contains(PostParam::DescriptorId) {
    return Err(ValidationError::SourceIdRequired);
  }
  if !params.contains(PostParam::PrivacyType) {
    return Err(ValidationError::PrivacyTypeRequired);
  }
  if !params.contains(PostParam::PrivacyMembers) {
    return Err(ValidationError::PrivacyMembersRequired);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(fields: &[(PostParam, &str)]) -> PostParams {
    fields.iter().map(|(k, v)| (*k, v.to_string())).collect()
  }

  fn complete_submit() -> PostParams {
    params(&[
      (PostParam::Indicator, "evil.example.com"),
      (PostParam::Type, "DOMAIN"),
      (PostParam::Description, "seen in phishing kit"),
      (PostParam::ShareLevel, "AMBER"),
      (PostParam::Status, "MALICIOUS"),
      (PostParam::PrivacyType, "VISIBLE"),
    ])
  }

  // ── Submit ────────────────────────────────────────────────────────────────

  #[test]
  fn submit_complete_passes() {
    assert_eq!(validate(MutationKind::Submit, &complete_submit()), Ok(()));
  }

  #[test]
  fn submit_rejects_descriptor_id() {
    let mut p = complete_submit();
    p.insert(PostParam::DescriptorId, "123");
    let err = validate(MutationKind::Submit, &p).unwrap_err();
    assert_eq!(err, ValidationError::DescriptorIdForbidden);
    assert!(err.to_string().contains("descriptor_id"));
  }

  #[test]
  fn submit_reports_single_missing_field() {
    let mut p = complete_submit();
    p.remove(PostParam::Status);
    let err = validate(MutationKind::Submit, &p).unwrap_err();
    assert_eq!(err.to_string(), "Missing field status");
  }

  #[test]
  fn submit_reports_every_missing_field() {
    let p = params(&[(PostParam::Indicator, "x"), (PostParam::Status, "y")]);
    let err = validate(MutationKind::Submit, &p).unwrap_err();
    assert_eq!(
      err.to_string(),
      "Missing fields type,description,share_level,privacy_type"
    );
  }

  // ── Update ────────────────────────────────────────────────────────────────

  #[test]
  fn update_requires_descriptor_id() {
    let err = validate(MutationKind::Update, &PostParams::new()).unwrap_err();
    assert_eq!(err, ValidationError::DescriptorIdRequired);
    assert!(err.to_string().contains("Descriptor ID"));
  }

  #[test]
  fn update_rejects_indicator() {
    let p = params(&[(PostParam::DescriptorId, "1"), (PostParam::Indicator, "x")]);
    assert_eq!(
      validate(MutationKind::Update, &p),
      Err(ValidationError::IndicatorImmutable)
    );
  }

  #[test]
  fn update_rejects_type() {
    let p = params(&[(PostParam::DescriptorId, "1"), (PostParam::Type, "URI")]);
    assert_eq!(
      validate(MutationKind::Update, &p),
      Err(ValidationError::TypeImmutable)
    );
  }

  // Pins the reported wording when both immutable fields are present: the
  // indicator message wins even though the type is also disallowed.
  #[test]
  fn update_with_indicator_and_type_reports_indicator() {
    let p = params(&[
      (PostParam::DescriptorId, "1"),
      (PostParam::Indicator, "x"),
      (PostParam::Type, "URI"),
    ]);
    let err = validate(MutationKind::Update, &p).unwrap_err();
    assert_eq!(err.to_string(), "Indicator must not be specified for update.");
  }

  #[test]
  fn update_with_other_fields_passes() {
    let p = params(&[
      (PostParam::DescriptorId, "1"),
      (PostParam::Status, "NON_MALICIOUS"),
    ]);
    assert_eq!(validate(MutationKind::Update, &p), Ok(()));
  }

  // ── Copy ──────────────────────────────────────────────────────────────────

  #[test]
  fn copy_checks_fields_in_order() {
    assert_eq!(
      validate(MutationKind::Copy, &PostParams::new()),
      Err(ValidationError::SourceIdRequired)
    );
    let p = params(&[(PostParam::DescriptorId, "1")]);
    assert_eq!(
      validate(MutationKind::Copy, &p),
      Err(ValidationError::PrivacyTypeRequired)
    );
    let p = params(&[(PostParam::DescriptorId, "1"), (PostParam::PrivacyType, "x")]);
    let err = validate(MutationKind::Copy, &p).unwrap_err();
    assert_eq!(err, ValidationError::PrivacyMembersRequired);
    assert!(err.to_string().contains("Privacy members"));
  }

  #[test]
  fn copy_complete_passes() {
    let p = params(&[
      (PostParam::DescriptorId, "1"),
      (PostParam::PrivacyType, "HAS_PRIVACY_GROUP"),
      (PostParam::PrivacyMembers, "781588512307315"),
    ]);
    assert_eq!(validate(MutationKind::Copy, &p), Ok(()));
  }
}
