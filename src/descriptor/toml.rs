//! `module.toml` descriptor source
//!
//! Each module lives in its own directory with a descriptor file:
//!
//! ```toml
//! [module]
//! namespace = "org.acme"      # optional, inherited from [parent]
//! name = "core"
//! version = "1.2-SNAPSHOT"    # optional, inherited from [parent]
//! modules = ["util", "app"]   # child directories, relative to this one
//!
//! [parent]
//! namespace = "org.acme"
//! name = "acme-parent"
//! version = "1.2-SNAPSHOT"
//!
//! [[dependencies]]
//! name = "util"               # namespace defaults to the module's own
//! ```

use super::{DescriptorSource, ModuleDescriptor};
use crate::core::error::DescriptorError;
use crate::graph::ModuleKey;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default descriptor file name
pub const DEFAULT_DESCRIPTOR_FILE: &str = "module.toml";

#[derive(Debug, Deserialize)]
struct RawDescriptor {
  module: RawModule,
  #[serde(default)]
  parent: Option<RawParent>,
  #[serde(default)]
  dependencies: Vec<RawDependency>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
  #[serde(default)]
  namespace: Option<String>,
  name: String,
  #[serde(default)]
  version: Option<String>,
  #[serde(default)]
  modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawParent {
  namespace: String,
  name: String,
  #[serde(default)]
  version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDependency {
  #[serde(default)]
  namespace: Option<String>,
  name: String,
}

/// Reads `module.toml` (or a configured file name) from module directories.
#[derive(Debug, Clone)]
pub struct TomlDescriptorSource {
  file_name: String,
}

impl Default for TomlDescriptorSource {
  fn default() -> Self {
    Self::new(DEFAULT_DESCRIPTOR_FILE)
  }
}

impl TomlDescriptorSource {
  pub fn new(file_name: impl Into<String>) -> Self {
    Self {
      file_name: file_name.into(),
    }
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  /// Descriptor file for a location: the location itself if it is a file,
  /// otherwise `<location>/<file_name>`.
  pub fn descriptor_path(&self, location: &Path) -> PathBuf {
    if location.is_file() {
      location.to_path_buf()
    } else {
      location.join(&self.file_name)
    }
  }

  /// Parse descriptor text. `path` is used for error reporting and child resolution.
  pub fn parse(&self, path: &Path, content: &str) -> Result<ModuleDescriptor, DescriptorError> {
    let malformed = |reason: String| DescriptorError::Malformed {
      path: path.to_path_buf(),
      reason,
    };

    let raw: RawDescriptor = toml_edit::de::from_str(content).map_err(|e| malformed(e.to_string()))?;

    let name = raw.module.name.trim();
    if name.is_empty() {
      return Err(malformed("[module] name must not be empty".to_string()));
    }

    let namespace = raw
      .module
      .namespace
      .or_else(|| raw.parent.as_ref().map(|p| p.namespace.clone()))
      .filter(|ns| !ns.trim().is_empty())
      .ok_or_else(|| malformed("no namespace declared or inherited from [parent]".to_string()))?;
    let namespace = namespace.trim();

    let version = raw
      .module
      .version
      .or_else(|| raw.parent.as_ref().and_then(|p| p.version.clone()))
      .filter(|v| !v.trim().is_empty())
      .ok_or_else(|| malformed("no version declared or inherited from [parent]".to_string()))?;

    let parent = raw
      .parent
      .as_ref()
      .map(|p| ModuleKey::new(p.namespace.trim(), p.name.trim()));

    let dependencies = raw
      .dependencies
      .iter()
      .map(|d| ModuleKey::new(d.namespace.as_deref().map_or(namespace, str::trim), d.name.trim()))
      .collect();

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let children = raw
      .module
      .modules
      .iter()
      .map(|rel| {
        let child = base.join(rel);
        child.canonicalize().unwrap_or(child)
      })
      .collect();

    Ok(ModuleDescriptor {
      key: ModuleKey::new(namespace, name),
      version: version.trim().to_string(),
      parent,
      dependencies,
      children,
    })
  }
}

impl DescriptorSource for TomlDescriptorSource {
  fn read(&self, location: &Path) -> Result<Option<ModuleDescriptor>, DescriptorError> {
    let path = self.descriptor_path(location);
    if !path.exists() {
      return Ok(None);
    }

    let content = fs::read_to_string(&path).map_err(|e| DescriptorError::Malformed {
      path: path.clone(),
      reason: e.to_string(),
    })?;

    self.parse(&path, &content).map(Some)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn key(s: &str) -> ModuleKey {
    s.parse().unwrap()
  }

  #[test]
  fn test_parse_full_descriptor() {
    let source = TomlDescriptorSource::default();
    let desc = source
      .parse(
        Path::new("proj/core/module.toml"),
        r#"
[module]
namespace = "org.acme"
name = "core"
version = "1.2-SNAPSHOT"
modules = ["nested"]

[parent]
namespace = "org.acme"
name = "parent"

[[dependencies]]
name = "util"

[[dependencies]]
namespace = "org.other"
name = "lib"
"#,
      )
      .unwrap();

    assert_eq!(desc.key, key("org.acme:core"));
    assert_eq!(desc.version, "1.2-SNAPSHOT");
    assert_eq!(desc.parent, Some(key("org.acme:parent")));
    assert_eq!(desc.dependencies, vec![key("org.acme:util"), key("org.other:lib")]);
    assert_eq!(desc.children, vec![PathBuf::from("proj/core/nested")]);
  }

  #[test]
  fn test_keys_are_trimmed_everywhere() {
    let source = TomlDescriptorSource::default();
    let desc = source
      .parse(
        Path::new("module.toml"),
        r#"
[module]
namespace = " org.acme "
name = " core "
version = "1.0"

[parent]
namespace = " org.acme"
name = "parent "

[[dependencies]]
namespace = "org.other "
name = " lib"

[[dependencies]]
name = "util "
"#,
      )
      .unwrap();

    assert_eq!(desc.key, key("org.acme:core"));
    assert_eq!(desc.parent, Some(key("org.acme:parent")));
    assert_eq!(desc.dependencies, vec![key("org.other:lib"), key("org.acme:util")]);
  }

  #[test]
  fn test_namespace_and_version_inherited_from_parent() {
    let source = TomlDescriptorSource::default();
    let desc = source
      .parse(
        Path::new("module.toml"),
        r#"
[module]
name = "child"

[parent]
namespace = "org.acme"
name = "parent"
version = "3.1-SNAPSHOT"
"#,
      )
      .unwrap();

    assert_eq!(desc.key, key("org.acme:child"));
    assert_eq!(desc.version, "3.1-SNAPSHOT");
  }

  #[test]
  fn test_missing_namespace_is_malformed() {
    let source = TomlDescriptorSource::default();
    let err = source
      .parse(Path::new("module.toml"), "[module]\nname = \"x\"\nversion = \"1.0\"\n")
      .unwrap_err();
    assert!(matches!(err, DescriptorError::Malformed { .. }));
    assert!(err.to_string().contains("namespace"));
  }

  #[test]
  fn test_invalid_toml_is_malformed() {
    let source = TomlDescriptorSource::default();
    let err = source.parse(Path::new("module.toml"), "[module\nname=").unwrap_err();
    assert!(matches!(err, DescriptorError::Malformed { .. }));
  }

  #[test]
  fn test_read_missing_directory_is_none() {
    let dir = TempDir::new().unwrap();
    let source = TomlDescriptorSource::default();
    assert_eq!(source.read(&dir.path().join("absent")).unwrap(), None);
  }

  #[test]
  fn test_read_from_directory_and_resolve_children() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("a")).unwrap();
    std::fs::write(
      dir.path().join("module.toml"),
      "[module]\nnamespace = \"g\"\nname = \"root\"\nversion = \"1.0\"\nmodules = [\"a\"]\n",
    )
    .unwrap();

    let source = TomlDescriptorSource::default();
    let desc = source.read(dir.path()).unwrap().unwrap();
    assert_eq!(desc.key, key("g:root"));
    assert_eq!(desc.children, vec![dir.path().join("a").canonicalize().unwrap()]);
  }

  #[test]
  fn test_custom_file_name() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
      dir.path().join("release.toml"),
      "[module]\nnamespace = \"g\"\nname = \"root\"\nversion = \"1.0\"\n",
    )
    .unwrap();

    assert!(TomlDescriptorSource::default().read(dir.path()).unwrap().is_none());
    assert!(TomlDescriptorSource::new("release.toml").read(dir.path()).unwrap().is_some());
  }
}
