//! Local repository on disk
//!
//! Layout: `<root>/<namespace with . as />/<name>/<version>/`. Every version
//! directory counts as published, except snapshots.

use super::{ArtifactRegistry, namespace_path};
use crate::core::error::RegistryError;
use crate::graph::ModuleKey;
use crate::release::version::{VersionRange, highest_in_range};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Repository directory laid out by namespace, name and version
#[derive(Debug, Clone)]
pub struct LocalRepository {
  root: PathBuf,
}

impl LocalRepository {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Directory holding one subdirectory per published version of `key`
  pub fn artifact_dir(&self, key: &ModuleKey) -> PathBuf {
    self.root.join(namespace_path(key)).join(key.name())
  }

  fn io_error(&self, err: io::Error) -> RegistryError {
    RegistryError::Io {
      location: self.location(),
      reason: err.to_string(),
    }
  }
}

impl ArtifactRegistry for LocalRepository {
  fn highest_version(&self, key: &ModuleKey, range: &VersionRange) -> Result<Option<String>, RegistryError> {
    if !self.root.is_dir() {
      return Err(RegistryError::Unreachable {
        location: self.location(),
        reason: "repository directory does not exist".to_string(),
      });
    }

    let dir = self.artifact_dir(key);
    let entries = match fs::read_dir(&dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(module = %key, path = %dir.display(), "artifact not in local repository");
        return Ok(None);
      }
      Err(e) => return Err(self.io_error(e)),
    };

    let mut versions = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|e| self.io_error(e))?;
      if entry.file_type().map_err(|e| self.io_error(e))?.is_dir() {
        versions.push(entry.file_name().to_string_lossy().into_owned());
      }
    }

    let highest = highest_in_range(versions.iter().map(String::as_str), range);
    debug!(module = %key, %range, found = ?highest, "local repository lookup");
    Ok(highest)
  }

  fn location(&self) -> String {
    self.root.display().to_string()
  }
}
