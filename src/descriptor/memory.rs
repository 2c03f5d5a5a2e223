//! In-memory descriptor source

use super::{DescriptorSource, ModuleDescriptor};
use crate::core::error::DescriptorError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Entry {
  Descriptor(ModuleDescriptor),
  Malformed(String),
}

/// Descriptor source backed by a map of location → descriptor.
#[derive(Debug, Clone, Default)]
pub struct MemoryDescriptorSource {
  entries: HashMap<PathBuf, Entry>,
}

impl MemoryDescriptorSource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a descriptor at `location`
  pub fn with(mut self, location: impl Into<PathBuf>, descriptor: ModuleDescriptor) -> Self {
    self.insert(location, descriptor);
    self
  }

  /// Register a location whose descriptor fails to parse
  pub fn with_malformed(mut self, location: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
    self.entries.insert(location.into(), Entry::Malformed(reason.into()));
    self
  }

  pub fn insert(&mut self, location: impl Into<PathBuf>, descriptor: ModuleDescriptor) {
    self.entries.insert(location.into(), Entry::Descriptor(descriptor));
  }
}

impl DescriptorSource for MemoryDescriptorSource {
  fn read(&self, location: &Path) -> Result<Option<ModuleDescriptor>, DescriptorError> {
    match self.entries.get(location) {
      None => Ok(None),
      Some(Entry::Descriptor(d)) => Ok(Some(d.clone())),
      Some(Entry::Malformed(reason)) => Err(DescriptorError::Malformed {
        path: location.to_path_buf(),
        reason: reason.clone(),
      }),
    }
  }
}
