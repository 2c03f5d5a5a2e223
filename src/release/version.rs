//! Version string arithmetic
//!
//! Module versions are dot-separated strings such as `1.4.2`, `2.0` or
//! `3.2-SNAPSHOT`. They are not required to be semver, so everything here
//! works segment-wise on the raw string.

use crate::core::error::{TrainError, TrainResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Marker used by development versions
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Increment the last dot-separated numeric segment, keeping everything before it verbatim.
///
/// `1.4.2` → `1.4.3`, `2.0` → `2.1`, `7` → `8`. A version whose last segment is
/// not a plain number (`abc`, `3.2-SNAPSHOT`, `1.`) is rejected.
pub fn next_version(version: &str) -> TrainResult<String> {
  let (prefix, last) = match version.rfind('.') {
    Some(pos) => version.split_at(pos + 1),
    None => ("", version),
  };

  if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
    return Err(TrainError::invalid_version(version, None));
  }

  let next = last
    .parse::<u64>()
    .ok()
    .and_then(|n| n.checked_add(1))
    .ok_or_else(|| TrainError::invalid_version(version, None))?;

  Ok(format!("{}{}", prefix, next))
}

/// The version with any pre-release suffix (everything from the first `-`) removed.
///
/// `3.2-SNAPSHOT` → `3.2`, `1.0-rc-1` → `1.0`, `2.1` → `2.1`.
pub fn major_line(version: &str) -> &str {
  match version.find('-') {
    Some(pos) => &version[..pos],
    None => version,
  }
}

/// Whether a version is a development snapshot
pub fn is_snapshot(version: &str) -> bool {
  version
    .len()
    .checked_sub(SNAPSHOT_SUFFIX.len())
    .and_then(|start| version.get(start..))
    .is_some_and(|tail| tail.eq_ignore_ascii_case(SNAPSHOT_SUFFIX))
}

/// Compare two version strings.
///
/// The release part (before the first `-`) is compared segment by segment:
/// numbers numerically, missing segments as `0`, numbers below non-numeric
/// segments. On a tie, a qualified version (`1.0-rc1`) sorts before the plain
/// release (`1.0`), and two qualifiers compare lexically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
  let (a_release, a_qualifier) = split_qualifier(a);
  let (b_release, b_qualifier) = split_qualifier(b);

  let a_segments: Vec<&str> = a_release.split('.').collect();
  let b_segments: Vec<&str> = b_release.split('.').collect();
  let len = a_segments.len().max(b_segments.len());

  for i in 0..len {
    let ord = compare_segment(a_segments.get(i).copied(), b_segments.get(i).copied());
    if ord != Ordering::Equal {
      return ord;
    }
  }

  match (a_qualifier, b_qualifier) {
    (None, None) => Ordering::Equal,
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (Some(x), Some(y)) => x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()),
  }
}

fn split_qualifier(version: &str) -> (&str, Option<&str>) {
  match version.split_once('-') {
    Some((release, qualifier)) => (release, Some(qualifier)),
    None => (version, None),
  }
}

fn compare_segment(a: Option<&str>, b: Option<&str>) -> Ordering {
  let a = a.unwrap_or("0");
  let b = b.unwrap_or("0");
  match (a.parse::<u64>(), b.parse::<u64>()) {
    (Ok(x), Ok(y)) => x.cmp(&y),
    (Ok(_), Err(_)) => Ordering::Less,
    (Err(_), Ok(_)) => Ordering::Greater,
    (Err(_), Err(_)) => a.cmp(b),
  }
}

/// Half-open version range: `lower` inclusive, `upper` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
  pub lower: String,
  pub upper: String,
}

impl VersionRange {
  pub fn new(lower: impl Into<String>, upper: impl Into<String>) -> Self {
    Self {
      lower: lower.into(),
      upper: upper.into(),
    }
  }

  /// `[major line, next major line)` for a module's current version.
  ///
  /// `3.2-SNAPSHOT` → `[3.2, 3.3)`.
  pub fn major_line_of(version: &str) -> TrainResult<Self> {
    let line = major_line(version);
    let upper = next_version(line)?;
    Ok(Self::new(line, upper))
  }

  pub fn contains(&self, version: &str) -> bool {
    compare_versions(version, &self.lower) != Ordering::Less
      && compare_versions(version, &self.upper) == Ordering::Less
  }
}

impl fmt::Display for VersionRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{},{})", self.lower, self.upper)
  }
}

/// Highest version in `candidates` that lies in `range` and is not a snapshot.
pub fn highest_in_range<'a>(candidates: impl IntoIterator<Item = &'a str>, range: &VersionRange) -> Option<String> {
  candidates
    .into_iter()
    .map(str::trim)
    .filter(|v| !v.is_empty() && !is_snapshot(v) && range.contains(v))
    .max_by(|a, b| compare_versions(a, b))
    .map(str::to_string)
}
