//! Descriptor sources: where module declarations come from
//!
//! A descriptor source turns a location into a [`ModuleDescriptor`]. The graph
//! builder only talks to the [`DescriptorSource`] trait, so the on-disk format
//! stays an implementation detail:
//!
//! - **toml**: `module.toml` files in a directory tree (the default)
//! - **memory**: descriptors registered in-process (embedding, tests)

pub mod memory;
pub mod toml;

pub use memory::MemoryDescriptorSource;
pub use toml::TomlDescriptorSource;

use crate::core::error::DescriptorError;
use crate::graph::ModuleKey;
use std::path::{Path, PathBuf};

/// One module as declared by its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
  pub key: ModuleKey,
  pub version: String,
  pub parent: Option<ModuleKey>,
  pub dependencies: Vec<ModuleKey>,
  /// Child descriptor locations, already resolved against this descriptor's location
  pub children: Vec<PathBuf>,
}

impl ModuleDescriptor {
  pub fn new(key: ModuleKey, version: impl Into<String>) -> Self {
    Self {
      key,
      version: version.into(),
      parent: None,
      dependencies: Vec::new(),
      children: Vec::new(),
    }
  }

  pub fn parent(mut self, parent: ModuleKey) -> Self {
    self.parent = Some(parent);
    self
  }

  pub fn depends_on(mut self, dependency: ModuleKey) -> Self {
    self.dependencies.push(dependency);
    self
  }

  pub fn child(mut self, location: impl Into<PathBuf>) -> Self {
    self.children.push(location.into());
    self
  }
}

/// Reads module descriptors.
///
/// `Ok(None)` means nothing is declared at `location`. `Err` means something is
/// there but cannot be read or parsed.
pub trait DescriptorSource {
  fn read(&self, location: &Path) -> Result<Option<ModuleDescriptor>, DescriptorError>;
}
