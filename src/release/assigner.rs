//! Version assignment
//!
//! Every module of the graph gets exactly one assignment:
//!
//! - modules of the release set get a **release version** (supplied by the
//!   caller) and a **development version** (their current version)
//! - every other module gets a **reference version**: the highest version it
//!   already published in its major line, looked up in the artifact registry
//!
//! Registry lookups are independent, so they run on the rayon pool and are
//! collected into the assignment map once all of them completed.

use crate::core::error::{TrainError, TrainResult};
use crate::graph::{ModuleGraph, ModuleKey};
use crate::registry::ArtifactRegistry;
use crate::release::resolver::ReleaseSet;
use crate::release::version::{VersionRange, major_line, next_version};
use crate::ui::progress::LookupProgress;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Shown for modules that never published a version in their major line
pub const NOT_RELEASED: &str = "- not released -";

/// What the registry knows about a module outside the release set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferenceVersion {
  /// Highest published version in the module's major line
  Published { version: String },

  /// Nothing published in the major line yet
  NotYetReleased,

  /// The registry could not be asked
  LookupFailed { reason: String },

  /// The module's own version has no major line to look up
  InvalidVersion { version: String },
}

impl ReferenceVersion {
  /// The published version, if there is one
  pub fn version(&self) -> Option<&str> {
    match self {
      ReferenceVersion::Published { version } => Some(version),
      _ => None,
    }
  }

  pub fn is_failure(&self) -> bool {
    matches!(
      self,
      ReferenceVersion::LookupFailed { .. } | ReferenceVersion::InvalidVersion { .. }
    )
  }

  /// Why no reference version could be determined
  pub fn failure_reason(&self) -> Option<String> {
    match self {
      ReferenceVersion::LookupFailed { reason } => Some(reason.clone()),
      ReferenceVersion::InvalidVersion { version } => {
        Some(format!("version '{}' has no numeric segment to derive a major line from", version))
      }
      _ => None,
    }
  }
}

impl fmt::Display for ReferenceVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReferenceVersion::Published { version } => write!(f, "{}", version),
      ReferenceVersion::NotYetReleased => write!(f, "{}", NOT_RELEASED),
      ReferenceVersion::LookupFailed { .. } => write!(f, "- lookup failed -"),
      ReferenceVersion::InvalidVersion { .. } => write!(f, "- invalid version -"),
    }
  }
}

/// Versions decided for one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionAssignment {
  /// Module is released in this run
  Release {
    release_version: String,
    development_version: String,
  },

  /// Module is not released; other modules refer to this version of it
  Reference { reference: ReferenceVersion },
}

impl VersionAssignment {
  pub fn is_release(&self) -> bool {
    matches!(self, VersionAssignment::Release { .. })
  }
}

/// Assignment for every module of the graph, keyed and ordered by module key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersionAssignments {
  assignments: BTreeMap<ModuleKey, VersionAssignment>,
}

impl VersionAssignments {
  pub fn get(&self, key: &ModuleKey) -> Option<&VersionAssignment> {
    self.assignments.get(key)
  }

  pub fn len(&self) -> usize {
    self.assignments.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assignments.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ModuleKey, &VersionAssignment)> {
    self.assignments.iter()
  }

  /// Modules released in this run with (release, development) versions
  pub fn releases(&self) -> impl Iterator<Item = (&ModuleKey, &str, &str)> {
    self.assignments.iter().filter_map(|(key, assignment)| match assignment {
      VersionAssignment::Release {
        release_version,
        development_version,
      } => Some((key, release_version.as_str(), development_version.as_str())),
      VersionAssignment::Reference { .. } => None,
    })
  }

  /// Modules outside the release set with their reference versions
  pub fn references(&self) -> impl Iterator<Item = (&ModuleKey, &ReferenceVersion)> {
    self.assignments.iter().filter_map(|(key, assignment)| match assignment {
      VersionAssignment::Reference { reference } => Some((key, reference)),
      VersionAssignment::Release { .. } => None,
    })
  }

  /// Modules without a reference version because the lookup failed, with the reason
  pub fn registry_failures(&self) -> Vec<(ModuleKey, String)> {
    self
      .references()
      .filter_map(|(key, reference)| reference.failure_reason().map(|reason| (key.clone(), reason)))
      .collect()
  }

  fn insert(&mut self, key: ModuleKey, assignment: VersionAssignment) {
    self.assignments.insert(key, assignment);
  }
}

/// Assigns versions to every module of a graph for one release set.
pub struct VersionAssigner<'a> {
  graph: &'a ModuleGraph,
  registry: &'a dyn ArtifactRegistry,
  parallel: bool,
  strict: bool,
  progress: bool,
}

impl<'a> VersionAssigner<'a> {
  pub fn new(graph: &'a ModuleGraph, registry: &'a dyn ArtifactRegistry) -> Self {
    Self {
      graph,
      registry,
      parallel: true,
      strict: false,
      progress: false,
    }
  }

  /// Query the registry concurrently (default: true)
  pub fn parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  /// Fail on the first registry error instead of recording it (default: false)
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  /// Draw a progress bar on interactive stderr (default: false)
  pub fn show_progress(mut self, progress: bool) -> Self {
    self.progress = progress;
    self
  }

  /// Reference version of one module, looked up in its own major line.
  ///
  /// # Errors
  /// - unknown module
  /// - [`TrainError::InvalidVersion`] when the module's major line has no numeric tail
  /// - [`TrainError::Registry`] in strict mode when the lookup fails
  pub fn reference_version(&self, key: &ModuleKey) -> TrainResult<ReferenceVersion> {
    let module = self.graph.require(key)?;
    let range = VersionRange::major_line_of(&module.version)
      .map_err(|_| TrainError::invalid_version(&module.version, Some(key)))?;

    match self.registry.highest_version(key, &range) {
      Ok(Some(version)) => {
        debug!(module = %key, %range, %version, "published version found");
        Ok(ReferenceVersion::Published { version })
      }
      Ok(None) => {
        debug!(module = %key, %range, "not yet released");
        Ok(ReferenceVersion::NotYetReleased)
      }
      Err(e) if self.strict => Err(e.into()),
      Err(e) => {
        warn!(module = %key, registry = %self.registry.location(), error = %e, "registry lookup failed");
        Ok(ReferenceVersion::LookupFailed { reason: e.to_string() })
      }
    }
  }

  /// Assign versions to every module of the graph.
  ///
  /// `release_versions` must hold a release version for every module of
  /// `release_set`; entries for other modules are ignored.
  pub fn assign(
    &self,
    release_set: &ReleaseSet,
    release_versions: &BTreeMap<ModuleKey, String>,
  ) -> TrainResult<VersionAssignments> {
    let mut assignments = VersionAssignments::default();

    for key in release_set.iter() {
      let module = self.graph.require(key)?;
      let release_version = release_versions.get(key).ok_or_else(|| {
        TrainError::with_help(
          format!("No release version given for module '{}'", key),
          format!("Pass --release-version {}=<version>", key),
        )
      })?;
      assignments.insert(
        key.clone(),
        VersionAssignment::Release {
          release_version: release_version.clone(),
          development_version: module.version.clone(),
        },
      );
    }

    let unselected: Vec<&ModuleKey> = self.graph.keys().filter(|k| !release_set.contains(k)).collect();
    for (key, reference) in self.lookup_all(&unselected)? {
      assignments.insert(key, VersionAssignment::Reference { reference });
    }

    let failures = assignments.registry_failures().len();
    info!(
      released = release_set.len(),
      referenced = unselected.len(),
      failures,
      "versions assigned"
    );

    Ok(assignments)
  }

  /// Look up reference versions, concurrently when enabled.
  fn lookup_all(&self, keys: &[&ModuleKey]) -> TrainResult<Vec<(ModuleKey, ReferenceVersion)>> {
    let progress = if self.progress {
      LookupProgress::interactive(keys.len(), "registry lookups")
    } else {
      None
    };

    let lookup = |key: &&ModuleKey| {
      let result = match self.reference_version(key) {
        // Recorded per module unless strict
        Err(TrainError::InvalidVersion { version, .. }) if !self.strict => {
          warn!(module = %key, %version, "no major line to look up, reference version unknown");
          Ok(ReferenceVersion::InvalidVersion { version })
        }
        other => other,
      }
      .map(|r| ((*key).clone(), r));
      if let Some(progress) = &progress {
        progress.inc();
      }
      result
    };

    if self.parallel {
      keys.par_iter().map(lookup).collect()
    } else {
      keys.iter().map(lookup).collect()
    }
  }

  /// Suggested release version for a module: the version after its latest
  /// published one, or `<major line>.0` when it never published.
  pub fn suggest_release_version(&self, key: &ModuleKey) -> TrainResult<String> {
    let reference = self.reference_version(key)?;
    self.suggest_from(key, &reference)
  }

  /// Suggested release version derived from an already known reference version.
  ///
  /// A failed lookup falls back to `<major line>.0`; callers that care should
  /// report the failure next to the suggestion.
  pub fn suggest_from(&self, key: &ModuleKey, reference: &ReferenceVersion) -> TrainResult<String> {
    let module = self.graph.require(key)?;
    match reference {
      ReferenceVersion::Published { version } => {
        next_version(version).map_err(|_| TrainError::invalid_version(version.as_str(), Some(key)))
      }
      ReferenceVersion::NotYetReleased | ReferenceVersion::LookupFailed { .. } => {
        Ok(format!("{}.0", major_line(&module.version)))
      }
      ReferenceVersion::InvalidVersion { version } => Err(TrainError::invalid_version(version.as_str(), Some(key))),
    }
  }

  /// Release version for a whole-project major release: the suggested release
  /// version of the root module.
  pub fn major_release_version(&self) -> TrainResult<String> {
    self.suggest_release_version(self.graph.root())
  }
}
