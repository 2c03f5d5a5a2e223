//! Artifact registry collaborators
//!
//! The version assigner asks a registry one question per module: what is the
//! highest version of this module published inside a version range. A registry
//! answers with a version, with "none found", or with a [`RegistryError`] when
//! the lookup itself failed. The two outcomes must never be conflated.
//!
//! Sessions are opened per resolution request with [`open`] and dropped when the
//! request completes.

pub mod http;
pub mod local;

use crate::core::config::RegistryConfig;
use crate::core::error::{RegistryError, TrainResult};
use crate::graph::ModuleKey;
use crate::release::version::VersionRange;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

pub use http::HttpRepository;
pub use local::LocalRepository;

/// Source of previously published module versions
pub trait ArtifactRegistry: Send + Sync {
  /// Highest published version of `key` inside `range`.
  ///
  /// `Ok(None)` means nothing was ever published in that range.
  fn highest_version(&self, key: &ModuleKey, range: &VersionRange) -> Result<Option<String>, RegistryError>;

  /// Human-readable location, used in logs and errors
  fn location(&self) -> String;
}

/// Registry credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: Option<String>,
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &self.password.as_ref().map(|_| "***"))
      .finish()
  }
}

/// Registry used when nothing is configured: every module is unreleased.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRegistry;

impl ArtifactRegistry for OfflineRegistry {
  fn highest_version(&self, key: &ModuleKey, range: &VersionRange) -> Result<Option<String>, RegistryError> {
    debug!(module = %key, %range, "offline registry lookup");
    Ok(None)
  }

  fn location(&self) -> String {
    "offline".to_string()
  }
}

/// Open a registry session for the given configuration.
///
/// Relative local repository paths are resolved against `base_dir`.
pub fn open(config: &RegistryConfig, base_dir: &Path) -> TrainResult<Box<dyn ArtifactRegistry>> {
  if let Some(url) = &config.url {
    let registry = HttpRepository::new(url, config.credentials(), config.timeout())?;
    debug!(location = %registry.location(), "opened http registry");
    return Ok(Box::new(registry));
  }

  if let Some(path) = &config.path {
    let registry = LocalRepository::new(base_dir.join(path));
    debug!(location = %registry.location(), "opened local registry");
    return Ok(Box::new(registry));
  }

  warn!("no registry configured, every unselected module will be reported as not yet released");
  Ok(Box::new(OfflineRegistry))
}

/// Namespace as a repository path fragment (`org.example` → `org/example`)
pub(crate) fn namespace_path(key: &ModuleKey) -> String {
  key.namespace().replace('.', "/")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_offline_registry_finds_nothing() {
    let key: ModuleKey = "org.example:core".parse().unwrap();
    let range = VersionRange::new("1.0", "1.1");
    assert_eq!(OfflineRegistry.highest_version(&key, &range).unwrap(), None);
  }

  #[test]
  fn test_namespace_path() {
    let key: ModuleKey = "org.example.tools:core".parse().unwrap();
    assert_eq!(namespace_path(&key), "org/example/tools");
  }

  #[test]
  fn test_credentials_debug_hides_password() {
    let creds = Credentials {
      username: "ci".to_string(),
      password: Some("hunter2".to_string()),
    };
    let debug = format!("{:?}", creds);
    assert!(debug.contains("ci"));
    assert!(!debug.contains("hunter2"));
  }

  #[test]
  fn test_open_without_registry_is_offline() {
    let registry = open(&RegistryConfig::default(), Path::new(".")).unwrap();
    assert_eq!(registry.location(), "offline");
  }

  #[test]
  fn test_open_local_resolves_relative_path() {
    let config = RegistryConfig {
      path: Some("repo".into()),
      ..Default::default()
    };
    let registry = open(&config, Path::new("/work/project")).unwrap();
    assert_eq!(registry.location(), Path::new("/work/project/repo").display().to_string());
  }
}
