//! Integration tests for `modtrain status`

use crate::helpers::{TestProject, run_modtrain, run_modtrain_unchecked, stdout_json};
use anyhow::Result;

#[test]
fn test_status_empty_directory() -> Result<()> {
  let project = TestProject::empty()?;

  let output = run_modtrain(&project.path, &["status", "--json"])?;
  let status = stdout_json(&output)?;

  assert_eq!(status["initialized"], false);
  assert_eq!(status["dirty"], false);
  assert_eq!(status["configured"], false);

  Ok(())
}

#[test]
fn test_status_initialized_project() -> Result<()> {
  let project = TestProject::new()?;
  project.use_local_registry()?;

  let output = run_modtrain(&project.path, &["status", "--json"])?;
  let status = stdout_json(&output)?;

  assert_eq!(status["initialized"], true);
  assert_eq!(status["dirty"], false);
  assert_eq!(status["configured"], true);

  Ok(())
}

#[test]
fn test_status_detects_release_backup() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("module.toml.releaseBackup", "")?;

  let output = run_modtrain(&project.path, &["status"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Dirty"));
  assert!(stdout.contains("modtrain release cleanup"));

  Ok(())
}

#[test]
fn test_status_rejects_invalid_config() -> Result<()> {
  let project = TestProject::new()?;
  project.write_file("train.toml", "[registry]\nurl = \"https://repo.example\"\npath = \"repo\"\n")?;

  let output = run_modtrain_unchecked(&project.path, &["status"])?;

  assert_eq!(output.status.code(), Some(1));

  Ok(())
}
