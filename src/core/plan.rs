//! Content-addressed plan identifiers
//!
//! Plans are hashed over their serialized contents, so the same input always
//! yields the same identifier and two plans can be compared at a glance.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Hash a serializable value through its JSON form
  pub fn of<T: Serialize>(value: &T) -> Self {
    let json = serde_json::to_vec(value).unwrap_or_default();
    Self::from_contents(&json)
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }

  /// Full hex digest
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}
