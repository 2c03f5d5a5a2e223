//! Reverse dependency index: module → modules that list it as a dependency

use super::module_graph::{ModuleGraph, ModuleKey};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Dependents-of map derived from a [`ModuleGraph`].
///
/// Only dependencies that resolve to a module of the graph produce entries.
/// Sets are ordered so every traversal over the index is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReverseDependencyIndex {
  dependents: BTreeMap<ModuleKey, BTreeSet<ModuleKey>>,
}

impl ReverseDependencyIndex {
  /// Invert the forward dependency edges of `graph`.
  pub fn build(graph: &ModuleGraph) -> Self {
    let mut dependents: BTreeMap<ModuleKey, BTreeSet<ModuleKey>> = BTreeMap::new();

    for module in graph.modules() {
      for dependency in &module.dependencies {
        if graph.contains(dependency) {
          dependents
            .entry(dependency.clone())
            .or_default()
            .insert(module.key.clone());
        }
      }
    }

    Self { dependents }
  }

  /// Modules that directly depend on `key` (empty when nothing does)
  pub fn dependents_of(&self, key: &ModuleKey) -> impl Iterator<Item = &ModuleKey> {
    self.dependents.get(key).into_iter().flatten()
  }

  /// Whether any module depends on `key`
  pub fn has_dependents(&self, key: &ModuleKey) -> bool {
    self.dependents.get(key).is_some_and(|d| !d.is_empty())
  }

  /// Iterate over (dependency, dependents) pairs in key order
  pub fn iter(&self) -> impl Iterator<Item = (&ModuleKey, &BTreeSet<ModuleKey>)> {
    self.dependents.iter()
  }
}
