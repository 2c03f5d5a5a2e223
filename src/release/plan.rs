//! Release planning: resolve, assign, compose
//!
//! A [`ReleasePlan`] is everything a release run needs, computed without side
//! effects: the release set, a version for every module, the order modules
//! must be released in and the composed release command.

use crate::core::error::{TrainError, TrainResult};
use crate::core::plan::PlanId;
use crate::graph::{ModuleGraph, ModuleKey, ReverseDependencyIndex};
use crate::registry::ArtifactRegistry;
use crate::release::assigner::{VersionAssigner, VersionAssignment, VersionAssignments};
use crate::release::command::{ReleaseCommand, ReleaseKind};
use crate::release::resolver::{ReleaseSet, ReleaseSetResolver, ResolveOptions};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A registry lookup that failed for a module outside the release set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryFailure {
  pub module: ModuleKey,
  pub reason: String,
}

/// Hashed part of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanContents {
  pub kind: ReleaseKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub release_set: Option<ReleaseSet>,
  pub assignments: VersionAssignments,
  pub release_order: Vec<ModuleKey>,
  pub registry_failures: Vec<RegistryFailure>,
  pub command: ReleaseCommand,
}

/// Reviewable release plan
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  /// Content hash over everything except `created_at`
  pub id: PlanId,
  pub created_at: DateTime<Utc>,
  #[serde(flatten)]
  pub contents: PlanContents,
}

impl ReleasePlan {
  pub fn new(contents: PlanContents) -> Self {
    Self {
      id: PlanId::of(&contents),
      created_at: Utc::now(),
      contents,
    }
  }

  pub fn kind(&self) -> ReleaseKind {
    self.contents.kind
  }

  pub fn command(&self) -> &ReleaseCommand {
    &self.contents.command
  }

  pub fn assignments(&self) -> &VersionAssignments {
    &self.contents.assignments
  }

  pub fn registry_failures(&self) -> &[RegistryFailure] {
    &self.contents.registry_failures
  }

  /// Serialize to JSON
  pub fn to_json(&self) -> TrainResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Get human-readable representation
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();

    output.push_str(&format!("📋 Release plan: {} ({})\n", self.contents.kind, self.id));

    if let Some(set) = &self.contents.release_set {
      output.push_str(&format!("   Release set ({}): {}\n", set.len(), join(set.iter())));
      if set.was_expanded() {
        output.push_str(&format!("   Added by closure: {}\n", join(set.added.iter())));
      }
    }

    if !self.contents.assignments.is_empty() {
      output.push_str("\n   Versions:\n");
      let width = self
        .contents
        .assignments
        .iter()
        .map(|(k, _)| k.to_string().len())
        .max()
        .unwrap_or(0);
      for (key, assignment) in self.contents.assignments.iter() {
        let line = match assignment {
          VersionAssignment::Release {
            release_version,
            development_version,
          } => format!("release {} (development {})", release_version, development_version),
          VersionAssignment::Reference { reference } => format!("keep    {}", reference),
        };
        output.push_str(&format!("     {:width$}  {}\n", key.to_string(), line, width = width));
      }
    }

    if !self.contents.registry_failures.is_empty() {
      output.push_str(&format!(
        "\n⚠️  Version lookup failed for {} module(s):\n",
        self.contents.registry_failures.len()
      ));
      for failure in &self.contents.registry_failures {
        output.push_str(&format!("     {}: {}\n", failure.module, failure.reason));
      }
    }

    if self.contents.release_order.len() > 1 {
      output.push_str(&format!("\n   Release order: {}\n", join(self.contents.release_order.iter())));
    }

    output.push_str(&format!("\n   Command:\n     {}\n", self.contents.command));
    output
  }
}

fn join<'a>(keys: impl Iterator<Item = &'a ModuleKey>) -> String {
  keys.map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Builds release plans for one graph and one registry session.
pub struct ReleasePlanner<'a> {
  graph: &'a ModuleGraph,
  index: &'a ReverseDependencyIndex,
  registry: &'a dyn ArtifactRegistry,
  options: ResolveOptions,
  extra_args: Vec<String>,
  parallel: bool,
  strict: bool,
  progress: bool,
}

impl<'a> ReleasePlanner<'a> {
  pub fn new(graph: &'a ModuleGraph, index: &'a ReverseDependencyIndex, registry: &'a dyn ArtifactRegistry) -> Self {
    Self {
      graph,
      index,
      registry,
      options: ResolveOptions::default(),
      extra_args: Vec::new(),
      parallel: true,
      strict: false,
      progress: false,
    }
  }

  pub fn options(mut self, options: ResolveOptions) -> Self {
    self.options = options;
    self
  }

  pub fn extra_args(mut self, extra_args: Vec<String>) -> Self {
    self.extra_args = extra_args;
    self
  }

  pub fn parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn show_progress(mut self, progress: bool) -> Self {
    self.progress = progress;
    self
  }

  fn assigner(&self) -> VersionAssigner<'a> {
    VersionAssigner::new(self.graph, self.registry)
      .parallel(self.parallel)
      .strict(self.strict)
      .show_progress(self.progress)
  }

  /// Plan a partial release of `selected`.
  ///
  /// Modules of the release set without an entry in `versions` get the
  /// suggested next release version.
  pub fn plan_minor(&self, selected: &[ModuleKey], versions: &BTreeMap<ModuleKey, String>) -> TrainResult<ReleasePlan> {
    if selected.is_empty() {
      return Err(TrainError::with_help(
        "No modules selected for release",
        "Pass at least one module with --select <namespace:name>",
      ));
    }

    for key in versions.keys() {
      self.graph.require(key)?;
    }

    let release_set = ReleaseSetResolver::new(self.graph, self.index).resolve(selected, self.options)?;
    let assigner = self.assigner();

    let mut release_versions = BTreeMap::new();
    let mut suggestion_failures = Vec::new();
    for key in release_set.iter() {
      let version = match versions.get(key) {
        Some(version) => version.clone(),
        None => self.suggest(&assigner, key, &mut suggestion_failures)?,
      };
      release_versions.insert(key.clone(), version);
    }
    for key in versions.keys().filter(|k| !release_set.contains(k)) {
      warn!(module = %key, "version given for a module outside the release set, ignoring");
    }

    let assignments = assigner.assign(&release_set, &release_versions)?;
    let command = ReleaseCommand::minor(self.graph, &assignments, &self.extra_args)?;
    let release_order = self.graph.release_order(release_set.iter());
    let registry_failures = failures(&assignments, suggestion_failures);

    info!(modules = release_set.len(), "minor release planned");

    Ok(ReleasePlan::new(PlanContents {
      kind: ReleaseKind::Minor,
      release_set: Some(release_set),
      assignments,
      release_order,
      registry_failures,
      command,
    }))
  }

  /// Plan a whole-project release under one version.
  ///
  /// Without an explicit version, the root module's suggested release version
  /// is used: the version after its latest published one in its major line,
  /// or `<root major line>.0`.
  pub fn plan_major(&self, version: Option<&str>) -> TrainResult<ReleasePlan> {
    let mut suggestion_failures = Vec::new();
    let release_version = match version {
      Some(v) => v.to_string(),
      None => self.suggest(&self.assigner(), self.graph.root(), &mut suggestion_failures)?,
    };

    let all: Vec<ModuleKey> = self.graph.keys().cloned().collect();
    let release_set = ReleaseSetResolver::new(self.graph, self.index).resolve(&all, self.options)?;
    let release_versions: BTreeMap<ModuleKey, String> =
      release_set.iter().map(|k| (k.clone(), release_version.clone())).collect();

    let assignments = self.assigner().assign(&release_set, &release_versions)?;
    let command = ReleaseCommand::major(self.graph, &release_version, &self.extra_args)?;
    let release_order = self.graph.release_order(release_set.iter());

    info!(version = %release_version, modules = release_set.len(), "major release planned");

    Ok(ReleasePlan::new(PlanContents {
      kind: ReleaseKind::Major,
      release_set: None,
      assignments,
      release_order,
      registry_failures: suggestion_failures,
      command,
    }))
  }

  /// Suggested release version for `key`. A failed lookup still yields the
  /// fallback suggestion and is recorded in `failures`.
  fn suggest(
    &self,
    assigner: &VersionAssigner<'_>,
    key: &ModuleKey,
    failures: &mut Vec<RegistryFailure>,
  ) -> TrainResult<String> {
    let reference = assigner.reference_version(key)?;
    let suggested = assigner.suggest_from(key, &reference)?;

    if let Some(reason) = reference.failure_reason() {
      warn!(module = %key, version = %suggested, "release version suggested without registry data");
      failures.push(RegistryFailure {
        module: key.clone(),
        reason,
      });
    } else {
      debug!(module = %key, version = %suggested, "using suggested release version");
    }

    Ok(suggested)
  }

  /// Plan that only carries a command (initialize, cleanup)
  pub fn plan_command(command: ReleaseCommand) -> ReleasePlan {
    ReleasePlan::new(PlanContents {
      kind: command.kind,
      release_set: None,
      assignments: VersionAssignments::default(),
      release_order: Vec::new(),
      registry_failures: Vec::new(),
      command,
    })
  }
}

fn failures(assignments: &VersionAssignments, suggestion_failures: Vec<RegistryFailure>) -> Vec<RegistryFailure> {
  let mut failures: Vec<RegistryFailure> = assignments
    .registry_failures()
    .into_iter()
    .map(|(module, reason)| RegistryFailure { module, reason })
    .chain(suggestion_failures)
    .collect();
  failures.sort_by(|a, b| a.module.cmp(&b.module));
  failures
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::module_graph::tests::{graph, key, module};
  use crate::release::assigner::ReferenceVersion;
  use crate::release::assigner::tests::FakeRegistry;

  fn project() -> ModuleGraph {
    let mut d = module("D", Some("A"), &[]);
    d.version = "3.2-SNAPSHOT".to_string();
    graph(vec![
      module("A", None, &[]),
      module("B", Some("A"), &["A"]),
      module("C", Some("A"), &["B"]),
      d,
    ])
  }

  fn expand() -> ResolveOptions {
    ResolveOptions {
      auto_expand: true,
      ..Default::default()
    }
  }

  #[test]
  fn test_minor_plan_fills_in_suggested_versions() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default().publish("g:A", &["1.0.4"]).publish("g:D", &["3.2.5"]);
    let planner = ReleasePlanner::new(&g, &index, &registry).options(expand());

    let versions = BTreeMap::from([(key("g:B"), "1.0.9".to_string())]);
    let plan = planner.plan_minor(&[key("g:B")], &versions).unwrap();

    let releases: Vec<_> = plan.assignments().releases().map(|(k, r, _)| (k.clone(), r.to_string())).collect();
    assert_eq!(
      releases,
      vec![
        (key("g:A"), "1.0.5".to_string()),
        (key("g:B"), "1.0.9".to_string()),
        (key("g:C"), "1.0.0".to_string()),
      ]
    );
    assert_eq!(
      plan.assignments().get(&key("g:D")),
      Some(&VersionAssignment::Reference {
        reference: ReferenceVersion::Published {
          version: "3.2.5".to_string()
        }
      })
    );
    assert_eq!(plan.contents.release_order, vec![key("g:A"), key("g:B"), key("g:C")]);
    assert_eq!(plan.command().tag.as_deref(), Some("1.0.5"));
  }

  #[test]
  fn test_minor_plan_propagates_missing_modules() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default();
    let planner = ReleasePlanner::new(&g, &index, &registry);

    let err = planner.plan_minor(&[key("g:B")], &BTreeMap::new()).unwrap_err();
    assert_eq!(err.missing_modules().unwrap(), &[key("g:A"), key("g:C")]);
  }

  #[test]
  fn test_minor_plan_lists_registry_failures() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default().fail("g:D");
    let plan = ReleasePlanner::new(&g, &index, &registry)
      .options(expand())
      .plan_minor(&[key("g:C")], &BTreeMap::new())
      .unwrap();

    assert_eq!(plan.registry_failures().len(), 1);
    assert_eq!(plan.registry_failures()[0].module, key("g:D"));
    assert!(plan.to_human_readable().contains("Version lookup failed"));
  }

  #[test]
  fn test_minor_plan_reports_failed_lookup_behind_suggestion() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default().fail("g:C");
    let plan = ReleasePlanner::new(&g, &index, &registry)
      .options(expand())
      .plan_minor(&[key("g:C")], &BTreeMap::new())
      .unwrap();

    let releases: BTreeMap<_, _> = plan.assignments().releases().map(|(k, r, _)| (k.clone(), r)).collect();
    assert_eq!(releases[&key("g:C")], "1.0.0");
    assert_eq!(plan.registry_failures().len(), 1);
    assert_eq!(plan.registry_failures()[0].module, key("g:C"));
    assert!(plan.registry_failures()[0].reason.contains("connection refused"));
  }

  #[test]
  fn test_explicit_version_needs_no_lookup() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default().fail("g:C");
    let versions = BTreeMap::from([(key("g:C"), "1.2.0".to_string())]);
    let plan = ReleasePlanner::new(&g, &index, &registry)
      .options(expand())
      .plan_minor(&[key("g:C")], &versions)
      .unwrap();

    assert!(plan.registry_failures().is_empty());
  }

  #[test]
  fn test_empty_selection_is_rejected() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default();
    assert!(
      ReleasePlanner::new(&g, &index, &registry)
        .plan_minor(&[], &BTreeMap::new())
        .is_err()
    );
  }

  #[test]
  fn test_major_plan_releases_everything() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default();
    let plan = ReleasePlanner::new(&g, &index, &registry).plan_major(None).unwrap();

    assert_eq!(plan.kind(), ReleaseKind::Major);
    assert_eq!(plan.assignments().releases().count(), 4);
    assert!(plan.assignments().releases().all(|(_, r, _)| r == "1.0.0"));
    assert!(plan.command().to_string().contains("-DreleaseVersion=1.0.0"));
    // Only the root is looked up, for the suggested version
    assert_eq!(registry.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
  }

  #[test]
  fn test_major_plan_skips_published_versions() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default().publish("g:A", &["1.0.0", "1.0.3"]);
    let plan = ReleasePlanner::new(&g, &index, &registry).plan_major(None).unwrap();

    assert!(plan.assignments().releases().all(|(_, r, _)| r == "1.0.4"));
    assert_eq!(plan.command().tag.as_deref(), Some("1.0.4"));
  }

  #[test]
  fn test_major_plan_reports_failed_root_lookup() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default().fail("g:A");
    let plan = ReleasePlanner::new(&g, &index, &registry).plan_major(None).unwrap();

    assert_eq!(plan.command().tag.as_deref(), Some("1.0.0"));
    assert_eq!(plan.registry_failures().len(), 1);
    assert_eq!(plan.registry_failures()[0].module, key("g:A"));
  }

  #[test]
  fn test_plan_id_ignores_creation_time() {
    let g = project();
    let index = ReverseDependencyIndex::build(&g);
    let registry = FakeRegistry::default();
    let planner = ReleasePlanner::new(&g, &index, &registry);

    let first = planner.plan_major(Some("2.0.0")).unwrap();
    let second = planner.plan_major(Some("2.0.0")).unwrap();
    let other = planner.plan_major(Some("2.1.0")).unwrap();
    assert_eq!(first.id, second.id);
    assert_ne!(first.id, other.id);
  }

  #[test]
  fn test_plan_json_has_flat_contents() {
    let plan = ReleasePlanner::plan_command(ReleaseCommand::cleanup());
    let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
    assert_eq!(json["kind"], "cleanup");
    assert_eq!(json["command"]["kind"], "cleanup");
    assert!(json["id"].as_str().is_some());
    assert!(json["created_at"].as_str().is_some());
  }
}
