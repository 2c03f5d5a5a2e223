//! Transitive dependents closure
//!
//! Given a starting module, collect every module that depends on it directly or
//! through a chain of dependencies. Traversal is breadth-first over the
//! [`ReverseDependencyIndex`] with a visited set, so cycles terminate.

use super::module_graph::ModuleKey;
use super::reverse_index::ReverseDependencyIndex;
use std::collections::{HashSet, VecDeque};

/// Every module that transitively depends on `start`, in order of first visit.
///
/// `start` itself is only part of the result when a dependency cycle routes
/// back to it.
pub fn transitive_dependents(index: &ReverseDependencyIndex, start: &ModuleKey) -> Vec<ModuleKey> {
  let mut visited: HashSet<&ModuleKey> = HashSet::new();
  let mut queue: VecDeque<&ModuleKey> = VecDeque::new();
  let mut result = Vec::new();

  queue.push_back(start);

  while let Some(current) = queue.pop_front() {
    for dependent in index.dependents_of(current) {
      if visited.insert(dependent) {
        result.push(dependent.clone());
        queue.push_back(dependent);
      }
    }
  }

  result
}
