//! Release command composition
//!
//! The four release operations (initialize, cleanup, major, minor) differ only
//! in the arguments they hand to the build tool's release plugin. They share one
//! data structure and one renderer, [`ReleaseCommand::to_args`].

use crate::core::error::TrainResult;
use crate::graph::{ModuleGraph, ModuleKey};
use crate::release::assigner::VersionAssignments;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const TAG_NAME_FORMAT: &str = "-DtagNameFormat=@{project.version}";
const RELEASE_GOALS: [&str; 2] = ["release:prepare", "release:perform"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseKind {
  /// Install the project so every module has a local artifact
  Initialize,
  /// Roll back a failed release
  Cleanup,
  /// Release every module under one new version
  Major,
  /// Release a subset of modules, each with its own version
  Minor,
}

impl fmt::Display for ReleaseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ReleaseKind::Initialize => "initialize",
      ReleaseKind::Cleanup => "cleanup",
      ReleaseKind::Major => "major",
      ReleaseKind::Minor => "minor",
    };
    f.write_str(name)
  }
}

/// Release and development version handed to the release plugin for one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionOverride {
  pub release_version: String,
  pub development_version: String,
}

/// A composed release-tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseCommand {
  pub kind: ReleaseKind,
  /// Tag created by the release
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tag: Option<String>,
  /// Project-wide versions (major releases)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub versions: Option<VersionOverride>,
  /// Per-module versions (minor releases)
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub overrides: BTreeMap<ModuleKey, VersionOverride>,
  /// Modules the build is restricted to
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub projects: Vec<ModuleKey>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub extra_args: Vec<String>,
}

impl ReleaseCommand {
  fn bare(kind: ReleaseKind) -> Self {
    Self {
      kind,
      tag: None,
      versions: None,
      overrides: BTreeMap::new(),
      projects: Vec::new(),
      extra_args: Vec::new(),
    }
  }

  pub fn initialize() -> Self {
    Self::bare(ReleaseKind::Initialize)
  }

  pub fn cleanup() -> Self {
    Self::bare(ReleaseKind::Cleanup)
  }

  /// Whole-project release: every module becomes `release_version`, and the
  /// project continues at the root module's current version.
  pub fn major(graph: &ModuleGraph, release_version: impl Into<String>, extra_args: &[String]) -> TrainResult<Self> {
    let release_version = release_version.into();
    let root = graph.require(graph.root())?;
    Ok(Self {
      tag: Some(release_version.clone()),
      versions: Some(VersionOverride {
        release_version,
        development_version: root.version.clone(),
      }),
      extra_args: extra_args.to_vec(),
      ..Self::bare(ReleaseKind::Major)
    })
  }

  /// Partial release of the modules assigned a release version.
  ///
  /// Modules outside the release set contribute an override only when they have
  /// a published reference version, so the release plugin can rewrite
  /// dependencies on them.
  pub fn minor(graph: &ModuleGraph, assignments: &VersionAssignments, extra_args: &[String]) -> TrainResult<Self> {
    let mut overrides = BTreeMap::new();
    let mut projects = Vec::new();

    for (key, release_version, development_version) in assignments.releases() {
      overrides.insert(
        key.clone(),
        VersionOverride {
          release_version: release_version.to_string(),
          development_version: development_version.to_string(),
        },
      );
      projects.push(key.clone());
    }

    if projects.is_empty() {
      return Ok(Self::bare(ReleaseKind::Minor));
    }

    for (key, reference) in assignments.references() {
      if let Some(version) = reference.version() {
        let module = graph.require(key)?;
        overrides.insert(
          key.clone(),
          VersionOverride {
            release_version: version.to_string(),
            development_version: module.version.clone(),
          },
        );
      }
    }

    let tag = overrides
      .get(graph.root())
      .filter(|_| projects.contains(graph.root()))
      .or_else(|| projects.first().and_then(|k| overrides.get(k)))
      .map(|o| o.release_version.clone());

    Ok(Self {
      tag,
      overrides,
      projects,
      extra_args: extra_args.to_vec(),
      ..Self::bare(ReleaseKind::Minor)
    })
  }

  /// Arguments for the release plugin
  pub fn to_args(&self) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    match self.kind {
      ReleaseKind::Initialize => args.push("install".to_string()),
      ReleaseKind::Cleanup => args.push("release:rollback".to_string()),
      ReleaseKind::Major => {
        if let (Some(tag), Some(versions)) = (&self.tag, &self.versions) {
          args.push("--batch-mode".to_string());
          args.push(format!("-Dtag={}", tag));
          args.push(TAG_NAME_FORMAT.to_string());
          args.push(format!("-DreleaseVersion={}", versions.release_version));
          args.push(format!("-DdevelopmentVersion={}", versions.development_version));
          args.extend(self.extra_args.iter().cloned());
        }
        args.extend(RELEASE_GOALS.iter().map(|g| g.to_string()));
      }
      ReleaseKind::Minor => {
        if !self.projects.is_empty() {
          if let Some(tag) = &self.tag {
            args.push(format!("-Dtag={}", tag));
          }
          args.push(TAG_NAME_FORMAT.to_string());
          for (key, versions) in &self.overrides {
            args.push(format!("-Dproject.rel.{}={}", key, versions.release_version));
            args.push(format!("-Dproject.dev.{}={}", key, versions.development_version));
          }
          args.push("-DignoreSnapshots=true".to_string());
          args.push("--projects".to_string());
          args.push(
            self
              .projects
              .iter()
              .map(ToString::to_string)
              .collect::<Vec<_>>()
              .join(","),
          );
          args.extend(self.extra_args.iter().cloned());
        }
        args.extend(RELEASE_GOALS.iter().map(|g| g.to_string()));
      }
    }

    args
  }
}

impl fmt::Display for ReleaseCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_args().join(" "))
  }
}
