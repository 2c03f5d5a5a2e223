//! `modtrain graph` and `modtrain dependents` - inspect the module graph

use crate::core::context::ReleaseContext;
use crate::core::error::TrainResult;
use crate::graph::{ModuleKey, transitive_dependents};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ModuleReport {
  key: ModuleKey,
  version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  parent: Option<ModuleKey>,
  dependencies: Vec<ModuleKey>,
  dependents: Vec<ModuleKey>,
  location: PathBuf,
}

#[derive(Debug, Serialize)]
struct GraphReport {
  root: ModuleKey,
  modules: Vec<ModuleReport>,
  cycles: Vec<Vec<ModuleKey>>,
}

#[derive(Debug, Serialize)]
struct DependentsReport {
  module: ModuleKey,
  dependents: Vec<ModuleKey>,
}

/// Run the graph command
pub fn run_graph(ctx: &ReleaseContext, json: bool) -> TrainResult<()> {
  let mut modules = Vec::with_capacity(ctx.graph.len());
  for module in ctx.graph.modules() {
    modules.push(ModuleReport {
      key: module.key.clone(),
      version: module.version.clone(),
      parent: module.parent.clone(),
      dependencies: ctx.graph.direct_dependencies(&module.key)?,
      dependents: ctx.index.dependents_of(&module.key).cloned().collect(),
      location: module.location.clone(),
    });
  }

  let report = GraphReport {
    root: ctx.graph.root().clone(),
    modules,
    cycles: ctx.graph.find_dependency_cycles(),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }

  println!("Module Graph");
  println!("============");
  println!();
  println!("Root: {}", report.root);
  println!("Modules: {}", report.modules.len());
  println!();

  for module in &report.modules {
    println!("📦 {} {}", module.key, module.version);
    if let Some(parent) = &module.parent {
      println!("   parent:     {}", parent);
    }
    if !module.dependencies.is_empty() {
      println!("   depends on: {}", join(&module.dependencies));
    }
    if !module.dependents.is_empty() {
      println!("   used by:    {}", join(&module.dependents));
    }
  }

  if !report.cycles.is_empty() {
    println!();
    println!("⚠️  Dependency cycles: {}", report.cycles.len());
    for cycle in &report.cycles {
      println!("   🔄 {}", join(cycle));
    }
  }

  Ok(())
}

/// Run the dependents command
pub fn run_dependents(ctx: &ReleaseContext, module: &ModuleKey, json: bool) -> TrainResult<()> {
  ctx.graph.require(module)?;
  let report = DependentsReport {
    module: module.clone(),
    dependents: transitive_dependents(&ctx.index, module),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }

  println!("Transitive dependents of {}: {}", report.module, report.dependents.len());
  for dependent in &report.dependents {
    println!("  ⬆  {}", dependent);
  }

  Ok(())
}

fn join(keys: &[ModuleKey]) -> String {
  keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
