//! `modtrain status` - is the project ready for a release?

use crate::core::config::TrainConfig;
use crate::core::error::TrainResult;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Suffix of the descriptor backup a release run leaves behind until it completes
pub const RELEASE_BACKUP_SUFFIX: &str = ".releaseBackup";

/// Release readiness of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatus {
  /// Root descriptor location
  pub root_descriptor: PathBuf,

  /// Root descriptor exists, so the module graph can be built
  pub initialized: bool,

  /// A previous release left its backup behind and needs a cleanup
  pub dirty: bool,

  /// Whether a train.toml was found
  pub configured: bool,
}

impl ProjectStatus {
  pub fn inspect(project_dir: &Path, config: &TrainConfig) -> Self {
    let root_descriptor = config.project.root_descriptor(project_dir);
    let mut backup = root_descriptor.clone().into_os_string();
    backup.push(RELEASE_BACKUP_SUFFIX);

    Self {
      initialized: root_descriptor.is_file(),
      dirty: Path::new(&backup).is_file(),
      configured: TrainConfig::exists(project_dir),
      root_descriptor,
    }
  }
}

/// Run the status command
pub fn run_status(project_dir: &Path, json: bool) -> TrainResult<()> {
  let config = TrainConfig::load(project_dir)?;
  let status = ProjectStatus::inspect(project_dir, &config);

  if json {
    println!("{}", serde_json::to_string_pretty(&status)?);
    return Ok(());
  }

  println!("Project: {}", project_dir.display());
  println!("Root descriptor: {}", status.root_descriptor.display());
  println!(
    "Config: {}",
    if status.configured { "train.toml" } else { "defaults (no train.toml)" }
  );
  println!();

  if status.initialized {
    println!("✅ Initialized");
  } else {
    println!("❌ Not initialized (run `modtrain release initialize`)");
  }

  if status.dirty {
    println!("⚠️  Dirty: a previous release did not complete (run `modtrain release cleanup`)");
  } else {
    println!("✅ Clean");
  }

  Ok(())
}
