//! Time expressions accepted for tagged-time and created-time filters.
//!
//! Three forms are understood, tried in this order:
//!
//! 1. integer epoch seconds, e.g. `1591626448`;
//! 2. an absolute timestamp in one of [`DATETIME_FORMATS`];
//! 3. a relative offset into the past, e.g. `-3hours` or `-1week`.
//!
//! Timestamps without an explicit offset are read as UTC.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use regex::Regex;

/// Absolute formats, most specific first. The first carries a numeric UTC
/// offset and matches what the graph API itself emits.
pub const DATETIME_FORMATS: [&str; 5] = [
  "%Y-%m-%dT%H:%M:%S%z",
  "%Y-%m-%d %H:%M:%S",
  "%Y/%m/%d %H:%M:%S",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M:%SZ",
];

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^-([0-9]+)(minute|hour|day|week)s?$")
    .expect("relative time pattern is valid")
});

/// Resolve `text` to epoch seconds, measuring relative offsets from now.
///
/// Returns `None` when no form matches; callers treat that as "no filter".
pub fn parse_time_expression(text: &str) -> Option<i64> {
  parse_time_expression_at(text, Utc::now())
}

/// As [`parse_time_expression`], with relative offsets measured from `now`.
pub fn parse_time_expression_at(text: &str, now: DateTime<Utc>) -> Option<i64> {
  parse_epoch_seconds(text)
    .or_else(|| parse_absolute(text))
    .or_else(|| parse_relative(text, now))
}

fn parse_epoch_seconds(text: &str) -> Option<i64> { text.parse().ok() }

fn parse_absolute(text: &str) -> Option<i64> {
  DATETIME_FORMATS
    .iter()
    .find_map(|format| parse_with_format(text, format))
}

fn parse_with_format(text: &str, format: &str) -> Option<i64> {
  if format.ends_with("%z") {
    DateTime::parse_from_str(text, format)
      .ok()
      .map(|dt| dt.timestamp())
  } else {
    NaiveDateTime::parse_from_str(text, format)
      .ok()
      .map(|dt| dt.and_utc().timestamp())
  }
}

fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<i64> {
  let caps = RELATIVE.captures(text)?;
  let count: i64 = caps[1].parse().ok()?;
  let delta = match &caps[2] {
    "minute" => TimeDelta::try_minutes(count),
    "hour" => TimeDelta::try_hours(count),
    "day" => TimeDelta::try_days(count),
    "week" => TimeDelta::try_weeks(count),
    _ => None,
  }?;
  now.checked_sub_signed(delta).map(|t| t.timestamp())
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 6, 8, 14, 27, 53).unwrap()
  }

  const NOW: i64 = 1_591_626_473;

  #[test]
  fn epoch_seconds_pass_through() {
    assert_eq!(parse_time_expression("1591626448"), Some(1_591_626_448));
  }

  #[test]
  fn server_format_with_offset() {
    assert_eq!(
      parse_time_expression("2020-05-01T07:02:25+0000"),
      Some(1_588_316_545)
    );
    assert_eq!(
      parse_time_expression("2020-06-08T14:27:53+0400"),
      Some(NOW - 4 * 3600)
    );
    assert_eq!(
      parse_time_expression("2020-06-08T14:27:53-0400"),
      Some(NOW + 4 * 3600)
    );
  }

  #[test]
  fn zulu_suffix_is_utc() {
    assert_eq!(parse_time_expression("2020-06-08T14:27:53Z"), Some(NOW));
  }

  #[test]
  fn offsetless_formats_are_utc() {
    assert_eq!(parse_time_expression("2020-06-08T14:27:53"), Some(NOW));
    assert_eq!(parse_time_expression("2020-06-08 14:27:53"), Some(NOW));
    assert_eq!(parse_time_expression("2020/06/08 14:27:53"), Some(NOW));
  }

  #[test]
  fn relative_units_singular_and_plural() {
    let at = |s| parse_time_expression_at(s, now());
    assert_eq!(at("-1minute"), Some(NOW - 60));
    assert_eq!(at("-3minutes"), Some(NOW - 180));
    assert_eq!(at("-1hour"), Some(NOW - 3600));
    assert_eq!(at("-3hours"), Some(NOW - 3 * 3600));
    assert_eq!(at("-1day"), Some(NOW - 86_400));
    assert_eq!(at("-3day"), Some(NOW - 3 * 86_400));
    assert_eq!(at("-1week"), Some(NOW - 604_800));
    assert_eq!(at("-3weeks"), Some(NOW - 3 * 604_800));
  }

  #[test]
  fn relative_uses_wall_clock() {
    let before = Utc::now().timestamp();
    let got = parse_time_expression("-1week").unwrap();
    let after = Utc::now().timestamp();
    assert!(got >= before - 604_800 && got <= after - 604_800);
  }

  #[test]
  fn unresolved_inputs() {
    let at = |s| parse_time_expression_at(s, now());
    assert_eq!(at("nonesuch"), None);
    assert_eq!(at(""), None);
    assert_eq!(at("-1 week"), None);
    assert_eq!(at("-1fortnight"), None);
    assert_eq!(at("1week"), None);
    assert_eq!(at("-1weeks ago"), None);
  }

  #[test]
  fn overflowing_offset_is_unresolved() {
    assert_eq!(parse_time_expression_at("-99999999999999999999day", now()), None);
    assert_eq!(parse_time_expression_at("-9999999999999week", now()), None);
  }
}
