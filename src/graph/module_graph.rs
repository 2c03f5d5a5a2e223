//! Module graph built from a project's descriptor tree + petgraph
//!
//! ## Graph Structure
//!
//! - **Directed Graph**: `A → B` means "A depends on B"
//! - **Nodes**: Modules of this project (external dependencies are not nodes)
//! - **Index**: key → node index, node indices follow discovery order
//! - **Parents**: kept on the module, not as edges; the containment hierarchy
//!   is walked separately from dependencies
//!
//! The graph is built once per resolution request and never mutated afterwards.

use crate::core::error::{DescriptorError, TrainError, TrainResult};
use crate::descriptor::{DescriptorSource, ModuleDescriptor};
use petgraph::Direction;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Module identity: namespace + name, unique within a project.
///
/// Displays and parses as `namespace:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleKey {
  namespace: String,
  name: String,
}

impl ModuleKey {
  pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      namespace: namespace.into(),
      name: name.into(),
    }
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl fmt::Display for ModuleKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.namespace, self.name)
  }
}

impl FromStr for ModuleKey {
  type Err = TrainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.split_once(':') {
      Some((namespace, name))
        if !namespace.trim().is_empty() && !name.trim().is_empty() && !name.contains(':') =>
      {
        Ok(Self::new(namespace.trim(), name.trim()))
      }
      _ => Err(TrainError::with_help(
        format!("Invalid module key '{}'", s),
        "Module keys are written as <namespace>:<name>, e.g. org.acme:core",
      )),
    }
  }
}

impl TryFrom<String> for ModuleKey {
  type Error = TrainError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<ModuleKey> for String {
  fn from(key: ModuleKey) -> Self {
    key.to_string()
  }
}

/// A module node in the graph.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
  pub key: ModuleKey,
  pub version: String,
  pub parent: Option<ModuleKey>,
  /// Declared dependencies, deduplicated, in declaration order.
  /// May reference modules outside this project.
  pub dependencies: Vec<ModuleKey>,
  /// Child modules that were found while reading the descriptor tree
  pub children: Vec<ModuleKey>,
  /// Descriptor location this module was read from
  pub location: PathBuf,
}

/// Module graph of a single project.
pub struct ModuleGraph {
  /// Nodes: Module, edges: dependent → dependency
  graph: DiGraph<Module, ()>,

  /// Index: module key → node index
  key_to_node: HashMap<ModuleKey, NodeIndex>,

  /// Key of the module read from the root descriptor
  root: ModuleKey,
}

impl ModuleGraph {
  /// Build the graph by reading the root descriptor and expanding its children depth-first.
  ///
  /// A missing or malformed root descriptor is fatal. A child whose descriptor is
  /// absent or malformed is skipped together with its subtree.
  pub fn build(source: &dyn DescriptorSource, root_location: &Path) -> TrainResult<Self> {
    let root_descriptor = source.read(root_location)?.ok_or_else(|| DescriptorError::NotFound {
      path: root_location.to_path_buf(),
    })?;

    let mut modules: Vec<Module> = Vec::new();
    let mut seen_keys: HashSet<ModuleKey> = HashSet::new();
    let mut seen_locations: HashSet<PathBuf> = HashSet::new();

    let root_key = root_descriptor.key.clone();
    seen_locations.insert(root_location.to_path_buf());
    expand(
      source,
      root_location,
      root_descriptor,
      &mut modules,
      &mut seen_keys,
      &mut seen_locations,
    );

    debug!(modules = modules.len(), root = %root_key, "module tree read");
    Ok(Self::from_modules(modules, root_key))
  }

  /// Assemble a graph from already-built modules.
  ///
  /// Dependency edges are added only for dependencies that resolve to a module in `modules`.
  pub fn from_modules(modules: Vec<Module>, root: ModuleKey) -> Self {
    let mut graph = DiGraph::new();
    let mut key_to_node = HashMap::new();

    for module in modules {
      let key = module.key.clone();
      if key_to_node.contains_key(&key) {
        warn!(module = %key, "duplicate module key, keeping first occurrence");
        continue;
      }
      let idx = graph.add_node(module);
      key_to_node.insert(key, idx);
    }

    let edges: Vec<(NodeIndex, NodeIndex)> = graph
      .node_indices()
      .flat_map(|from| {
        graph[from]
          .dependencies
          .iter()
          .filter_map(|dep| key_to_node.get(dep).map(|to| (from, *to)))
          .collect::<Vec<_>>()
      })
      .collect();
    for (from, to) in edges {
      graph.add_edge(from, to, ());
    }

    Self {
      graph,
      key_to_node,
      root,
    }
  }

  /// Key of the root module
  pub fn root(&self) -> &ModuleKey {
    &self.root
  }

  /// Look up a module by key
  pub fn get(&self, key: &ModuleKey) -> Option<&Module> {
    self.key_to_node.get(key).map(|idx| &self.graph[*idx])
  }

  /// Whether the key resolves to a module of this project
  pub fn contains(&self, key: &ModuleKey) -> bool {
    self.key_to_node.contains_key(key)
  }

  /// Number of modules
  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// All modules in discovery order
  pub fn modules(&self) -> impl Iterator<Item = &Module> {
    self.graph.node_indices().map(move |idx| &self.graph[idx])
  }

  /// All module keys in discovery order
  pub fn keys(&self) -> impl Iterator<Item = &ModuleKey> {
    self.modules().map(|m| &m.key)
  }

  /// Dependencies of a module that resolve within this project, sorted.
  pub fn direct_dependencies(&self, key: &ModuleKey) -> TrainResult<Vec<ModuleKey>> {
    let idx = self.find_node(key)?;
    let deps: BTreeSet<ModuleKey> = self
      .graph
      .neighbors_directed(idx, Direction::Outgoing)
      .map(|n| self.graph[n].key.clone())
      .collect();
    Ok(deps.into_iter().collect())
  }

  /// Resolve a user-supplied key, erroring with the list of known modules.
  pub fn require(&self, key: &ModuleKey) -> TrainResult<&Module> {
    self.find_node(key).map(|idx| &self.graph[idx])
  }

  /// Detect dependency cycles using Tarjan's SCC algorithm.
  ///
  /// Returns components of size > 1 plus modules depending on themselves,
  /// each sorted, in a deterministic order.
  pub fn find_dependency_cycles(&self) -> Vec<Vec<ModuleKey>> {
    let mut cycles: Vec<Vec<ModuleKey>> = algo::tarjan_scc(&self.graph)
      .into_iter()
      .filter(|component| {
        component.len() > 1 || self.graph.find_edge(component[0], component[0]).is_some()
      })
      .map(|component| {
        let mut keys: Vec<ModuleKey> = component.into_iter().map(|idx| self.graph[idx].key.clone()).collect();
        keys.sort();
        keys
      })
      .collect();
    cycles.sort();
    cycles
  }

  /// Order the given modules so dependencies come before their dependents.
  ///
  /// Modules caught in a dependency cycle keep discovery order relative to each
  /// other. Keys not in the graph are dropped.
  pub fn release_order<'a>(&self, keys: impl IntoIterator<Item = &'a ModuleKey>) -> Vec<ModuleKey> {
    let wanted: HashSet<NodeIndex> = keys.into_iter().filter_map(|k| self.key_to_node.get(k).copied()).collect();

    // Condense SCCs so cycles cannot block the ordering; tarjan_scc yields
    // components in reverse topological order, i.e. dependencies first.
    let mut order = Vec::with_capacity(wanted.len());
    for mut component in algo::tarjan_scc(&self.graph) {
      component.sort();
      for idx in component {
        if wanted.contains(&idx) {
          order.push(self.graph[idx].key.clone());
        }
      }
    }
    order
  }

  /// Find node index by key.
  fn find_node(&self, key: &ModuleKey) -> TrainResult<NodeIndex> {
    self.key_to_node.get(key).copied().ok_or_else(|| {
      let available: Vec<String> = self.keys().map(ToString::to_string).collect();
      TrainError::with_help(
        format!("Module '{}' not found. Available modules: {}", key, available.join(", ")),
        "Run `modtrain graph` to list the modules of this project.",
      )
    })
  }
}

/// Depth-first expansion of one descriptor and its declared children.
fn expand(
  source: &dyn DescriptorSource,
  location: &Path,
  descriptor: ModuleDescriptor,
  modules: &mut Vec<Module>,
  seen_keys: &mut HashSet<ModuleKey>,
  seen_locations: &mut HashSet<PathBuf>,
) -> Option<ModuleKey> {
  if !seen_keys.insert(descriptor.key.clone()) {
    warn!(
      module = %descriptor.key,
      location = %location.display(),
      "module key already declared by another descriptor, skipping"
    );
    return None;
  }

  let slot = modules.len();
  modules.push(Module {
    key: descriptor.key.clone(),
    version: descriptor.version.clone(),
    parent: descriptor.parent.clone(),
    dependencies: dedup(descriptor.dependencies),
    children: Vec::new(),
    location: location.to_path_buf(),
  });

  let mut children = Vec::new();
  for child_location in descriptor.children {
    if !seen_locations.insert(child_location.clone()) {
      debug!(location = %child_location.display(), "descriptor already read, skipping");
      continue;
    }

    let child = match source.read(&child_location) {
      Ok(Some(child)) => child,
      Ok(None) => {
        warn!(location = %child_location.display(), "child descriptor not found, skipping subtree");
        continue;
      }
      Err(e) => {
        warn!(error = %e, "child descriptor unreadable, skipping subtree");
        continue;
      }
    };

    if let Some(child_key) = expand(source, &child_location, child, modules, seen_keys, seen_locations) {
      children.push(child_key);
    }
  }

  modules[slot].children = children;
  Some(descriptor.key)
}

fn dedup(keys: Vec<ModuleKey>) -> Vec<ModuleKey> {
  let mut seen = HashSet::new();
  keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}
