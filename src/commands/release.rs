//! `modtrain release` - plan releases and compose release commands

use crate::core::context::ReleaseContext;
use crate::core::error::{TrainError, TrainResult};
use crate::graph::ModuleKey;
use crate::registry::ArtifactRegistry;
use crate::release::{ReleaseCommand, ReleasePlan, ReleasePlanner};
use serde::Serialize;
use std::collections::BTreeMap;

/// Parse a `namespace:name=version` override from the command line
pub fn parse_version_override(s: &str) -> Result<(ModuleKey, String), String> {
  let (key, version) = s
    .split_once('=')
    .ok_or_else(|| format!("expected <namespace:name>=<version>, got '{}'", s))?;
  let version = version.trim();
  if version.is_empty() {
    return Err(format!("missing version in '{}'", s));
  }
  let key: ModuleKey = key.trim().parse().map_err(|e: TrainError| e.to_string())?;
  Ok((key, version.to_string()))
}

#[derive(Serialize)]
struct MissingReport<'a> {
  error: &'static str,
  missing: &'a [ModuleKey],
}

fn planner<'a>(
  ctx: &'a ReleaseContext,
  registry: &'a dyn ArtifactRegistry,
  auto_expand: bool,
  json: bool,
) -> ReleasePlanner<'a> {
  ReleasePlanner::new(&ctx.graph, &ctx.index, registry)
    .options(ctx.resolve_options(auto_expand))
    .extra_args(ctx.config.release.extra_args.clone())
    .parallel(ctx.config.registry.parallel)
    .strict(ctx.config.registry.strict)
    .show_progress(!json)
}

fn print_plan(plan: &ReleasePlan, json: bool) -> TrainResult<()> {
  if json {
    println!("{}", plan.to_json()?);
  } else {
    print!("{}", plan.to_human_readable());
  }
  Ok(())
}

/// Run the release plan command
pub fn run_release_plan(
  ctx: &ReleaseContext,
  selected: Vec<ModuleKey>,
  auto_expand: bool,
  versions: Vec<(ModuleKey, String)>,
  json: bool,
) -> TrainResult<()> {
  let versions: BTreeMap<ModuleKey, String> = versions.into_iter().collect();
  let registry = ctx.open_registry()?;

  let plan = match planner(ctx, registry.as_ref(), auto_expand, json).plan_minor(&selected, &versions) {
    Ok(plan) => plan,
    Err(err) => {
      if json && let Some(missing) = err.missing_modules() {
        let report = MissingReport {
          error: "missing_modules",
          missing,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
      }
      return Err(err);
    }
  };

  print_plan(&plan, json)
}

/// Run the major release command
pub fn run_release_major(ctx: &ReleaseContext, version: Option<String>, json: bool) -> TrainResult<()> {
  let registry = ctx.open_registry()?;
  let plan = planner(ctx, registry.as_ref(), false, json).plan_major(version.as_deref())?;
  print_plan(&plan, json)
}

/// Run the initialize command
pub fn run_release_initialize(json: bool) -> TrainResult<()> {
  print_plan(&ReleasePlanner::plan_command(ReleaseCommand::initialize()), json)
}

/// Run the cleanup command
pub fn run_release_cleanup(json: bool) -> TrainResult<()> {
  print_plan(&ReleasePlanner::plan_command(ReleaseCommand::cleanup()), json)
}
