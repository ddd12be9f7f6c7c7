//! Client-side filtering of descriptors by creation time.

use crate::{descriptor::Descriptor, time::parse_time_expression};

/// Inclusive bounds on a descriptor's `added_on`, in epoch seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatedWindow {
  pub since: Option<i64>,
  pub until: Option<i64>,
}

impl CreatedWindow {
  pub fn is_unbounded(&self) -> bool {
    self.since.is_none() && self.until.is_none()
  }

  /// Whether `descriptor` was created inside the window.
  ///
  /// A descriptor whose creation time is unknown only passes an unbounded
  /// window.
  pub fn contains(&self, descriptor: &Descriptor) -> bool {
    if self.is_unbounded() {
      return true;
    }
    let Some(added_on) = descriptor
      .added_on
      .as_deref()
      .and_then(parse_time_expression)
    else {
      return false;
    };
    self.since.is_none_or(|since| added_on >= since)
      && self.until.is_none_or(|until| added_on <= until)
  }
}
