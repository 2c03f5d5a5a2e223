//! Release set resolution
//!
//! Releasing a module without everything that depends on it, or without the
//! modules above it in the containment hierarchy, leaves dangling version
//! references behind. The resolver closes a user selection over both relations:
//!
//! 1. **Dependents**: transitive dependents of every module in the set
//! 2. **Ancestry**: the parent chain of every module in the set, up to the first
//!    parent that is not part of this project
//!
//! Modules reached either way join the set and are expanded in turn, so the
//! result is closed under both relations.
//!
//! Whatever is reached but was not selected is *missing*. Missing modules are
//! either added (auto-expansion) or reported back as an error.

use crate::core::error::{CycleError, TrainError, TrainResult};
use crate::graph::{ModuleGraph, ModuleKey, ReverseDependencyIndex, transitive_dependents};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::{debug, info};

/// Knobs for [`ReleaseSetResolver::resolve`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
  /// Add missing modules instead of failing
  pub auto_expand: bool,
  /// Fail when a module of the release set sits on a dependency cycle
  pub reject_dependency_cycles: bool,
}

/// Closure analysis of a selection, before deciding what to do about missing modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSetAnalysis {
  /// Selected modules, deduplicated, in selection order
  pub selected: Vec<ModuleKey>,
  /// Unselected modules reached through reverse dependencies, in order of discovery
  pub missing_by_dependents: Vec<ModuleKey>,
  /// Unselected modules reached through parent chains, in order of discovery
  pub missing_by_ancestry: Vec<ModuleKey>,
}

impl ReleaseSetAnalysis {
  /// Union of both missing sets, sorted
  pub fn missing(&self) -> Vec<ModuleKey> {
    let all: BTreeSet<&ModuleKey> = self
      .missing_by_dependents
      .iter()
      .chain(self.missing_by_ancestry.iter())
      .collect();
    all.into_iter().cloned().collect()
  }

  pub fn is_complete(&self) -> bool {
    self.missing_by_dependents.is_empty() && self.missing_by_ancestry.is_empty()
  }
}

/// The final set of modules to release together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSet {
  /// What the user asked for
  pub selected: BTreeSet<ModuleKey>,
  /// What the closure added (empty unless auto-expanded)
  pub added: BTreeSet<ModuleKey>,
  /// selected ∪ added
  pub modules: BTreeSet<ModuleKey>,
}

impl ReleaseSet {
  pub fn contains(&self, key: &ModuleKey) -> bool {
    self.modules.contains(key)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ModuleKey> {
    self.modules.iter()
  }

  /// Whether the closure had to add modules to the selection
  pub fn was_expanded(&self) -> bool {
    !self.added.is_empty()
  }
}

/// Computes release sets over one graph and its reverse index.
pub struct ReleaseSetResolver<'a> {
  graph: &'a ModuleGraph,
  index: &'a ReverseDependencyIndex,
}

impl<'a> ReleaseSetResolver<'a> {
  pub fn new(graph: &'a ModuleGraph, index: &'a ReverseDependencyIndex) -> Self {
    Self { graph, index }
  }

  /// Compute what a selection is missing.
  ///
  /// # Errors
  /// - unknown module in `selected`
  /// - [`CycleError::Parent`] when a parent chain loops
  pub fn analyze(&self, selected: &[ModuleKey]) -> TrainResult<ReleaseSetAnalysis> {
    let mut seen = HashSet::new();
    let selected: Vec<ModuleKey> = selected.iter().filter(|k| seen.insert(*k)).cloned().collect();
    for key in &selected {
      self.graph.require(key)?;
    }

    // Every module entering the set is expanded in turn until nothing new is reached
    let mut in_set: HashSet<ModuleKey> = selected.iter().cloned().collect();
    let mut queue: VecDeque<ModuleKey> = selected.iter().cloned().collect();
    let mut missing_by_dependents = Vec::new();
    let mut missing_by_ancestry = Vec::new();

    while let Some(key) = queue.pop_front() {
      for dependent in transitive_dependents(self.index, &key) {
        if in_set.insert(dependent.clone()) {
          debug!(module = %dependent, via = %key, "missing through reverse dependency");
          missing_by_dependents.push(dependent.clone());
          queue.push_back(dependent);
        }
      }

      for ancestor in self.ancestors(&key)? {
        if in_set.insert(ancestor.clone()) {
          debug!(module = %ancestor, via = %key, "missing through ancestry");
          missing_by_ancestry.push(ancestor.clone());
          queue.push_back(ancestor);
        }
      }
    }

    Ok(ReleaseSetAnalysis {
      selected,
      missing_by_dependents,
      missing_by_ancestry,
    })
  }

  /// Resolve the final release set for a selection.
  ///
  /// # Errors
  /// Everything [`analyze`](Self::analyze) reports, plus:
  /// - [`TrainError::MissingModules`] (sorted) when modules are missing and
  ///   `auto_expand` is off
  /// - [`CycleError::Dependency`] when `reject_dependency_cycles` is on and the
  ///   release set touches a dependency cycle
  pub fn resolve(&self, selected: &[ModuleKey], options: ResolveOptions) -> TrainResult<ReleaseSet> {
    let analysis = self.analyze(selected)?;
    let missing = analysis.missing();

    if !missing.is_empty() && !options.auto_expand {
      return Err(TrainError::MissingModules { modules: missing });
    }

    let selected: BTreeSet<ModuleKey> = analysis.selected.into_iter().collect();
    let added: BTreeSet<ModuleKey> = missing.into_iter().collect();
    let modules: BTreeSet<ModuleKey> = selected.union(&added).cloned().collect();

    if options.reject_dependency_cycles {
      for cycle in self.graph.find_dependency_cycles() {
        if cycle.iter().any(|k| modules.contains(k)) {
          return Err(CycleError::Dependency { members: cycle }.into());
        }
      }
    }

    info!(
      selected = selected.len(),
      added = added.len(),
      total = modules.len(),
      "release set resolved"
    );

    Ok(ReleaseSet {
      selected,
      added,
      modules,
    })
  }

  /// Parent chain of a module, nearest first, restricted to modules of this project.
  ///
  /// The walk stops at the first parent key that does not resolve in the graph.
  pub fn ancestors(&self, key: &ModuleKey) -> TrainResult<Vec<ModuleKey>> {
    let mut chain = vec![key.clone()];
    let mut visited: HashSet<ModuleKey> = HashSet::from([key.clone()]);
    let mut current = self.graph.require(key)?;

    while let Some(parent_key) = &current.parent {
      let Some(parent) = self.graph.get(parent_key) else {
        break;
      };
      chain.push(parent_key.clone());
      if !visited.insert(parent_key.clone()) {
        return Err(CycleError::Parent { chain }.into());
      }
      current = parent;
    }

    chain.remove(0);
    Ok(chain)
  }
}
