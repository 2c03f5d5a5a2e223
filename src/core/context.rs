//! Release context - build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   ReleaseContext::build() -> &ReleaseContext
//!   |
//!   v
//! commands/graph.rs, release.rs, etc:
//!   fn run_*(ctx: &ReleaseContext, ...)
//! ```

use crate::core::config::TrainConfig;
use crate::core::error::TrainResult;
use crate::descriptor::TomlDescriptorSource;
use crate::graph::{ModuleGraph, ReverseDependencyIndex};
use crate::registry::{self, ArtifactRegistry};
use crate::release::resolver::{ReleaseSetResolver, ResolveOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Project-level data shared by every command.
///
/// The graph and its reverse index are built once from the descriptor tree.
#[derive(Clone)]
pub struct ReleaseContext {
  /// Project directory (where train.toml is looked up)
  pub root: PathBuf,

  /// Loaded configuration, defaults when no train.toml exists
  pub config: Arc<TrainConfig>,

  /// Module graph built from the descriptor tree
  pub graph: Arc<ModuleGraph>,

  /// Dependents-of index over `graph`
  pub index: Arc<ReverseDependencyIndex>,
}

impl ReleaseContext {
  /// Load config and build the module graph for a project directory.
  pub fn build(project_dir: &Path) -> TrainResult<Self> {
    let config = TrainConfig::load(project_dir)?;
    Self::with_config(project_dir, config)
  }

  /// Build the module graph with an already loaded config.
  pub fn with_config(project_dir: &Path, config: TrainConfig) -> TrainResult<Self> {
    let root = project_dir.to_path_buf();
    let source = TomlDescriptorSource::new(config.project.descriptor.clone());
    let graph = ModuleGraph::build(&source, &config.project.root_dir(&root))?;
    let index = ReverseDependencyIndex::build(&graph);

    info!(modules = graph.len(), root = %graph.root(), "module graph loaded");

    Ok(Self {
      root,
      config: Arc::new(config),
      graph: Arc::new(graph),
      index: Arc::new(index),
    })
  }

  /// Resolver over this context's graph
  pub fn resolver(&self) -> ReleaseSetResolver<'_> {
    ReleaseSetResolver::new(&self.graph, &self.index)
  }

  /// Resolve options from config, with a per-invocation auto-expand override
  pub fn resolve_options(&self, auto_expand: bool) -> ResolveOptions {
    ResolveOptions {
      auto_expand: auto_expand || self.config.release.auto_expand,
      reject_dependency_cycles: self.config.release.reject_dependency_cycles,
    }
  }

  /// Open a registry session for one request
  pub fn open_registry(&self) -> TrainResult<Box<dyn ArtifactRegistry>> {
    registry::open(&self.config.registry, &self.root)
  }

  /// Get project root as Path reference (convenience)
  pub fn project_root(&self) -> &Path {
    &self.root
  }
}
