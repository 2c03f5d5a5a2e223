//! Integration tests for `modtrain release` commands

use crate::helpers::{TestProject, key, run_modtrain, run_modtrain_unchecked, stdout_json};
use anyhow::Result;

#[test]
fn test_release_plan_incomplete_selection_fails() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain_unchecked(&project.path, &["release", "plan", "--select", "org.acme:core"])?;

  assert_eq!(output.status.code(), Some(3));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(
    stderr.contains("Missing modules: org.acme:app,org.acme:parent"),
    "unexpected stderr: {}",
    stderr
  );
  assert!(stderr.contains("--auto-expand"));

  Ok(())
}

#[test]
fn test_release_plan_incomplete_selection_json_report() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain_unchecked(&project.path, &["release", "plan", "--select", "org.acme:core", "--json"])?;

  assert_eq!(output.status.code(), Some(3));
  let report = stdout_json(&output)?;
  assert_eq!(report["error"], "missing_modules");
  assert_eq!(report["missing"], serde_json::json!([key("app"), key("parent")]));

  Ok(())
}

#[test]
fn test_release_plan_auto_expand() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain(
    &project.path,
    &["release", "plan", "--select", "org.acme:core", "--auto-expand", "--json"],
  )?;
  let plan = stdout_json(&output)?;

  assert_eq!(plan["kind"], "minor");
  assert_eq!(plan["release_set"]["selected"], serde_json::json!([key("core")]));
  assert_eq!(plan["release_set"]["added"], serde_json::json!([key("app"), key("parent")]));

  let core = &plan["assignments"][key("core").as_str()];
  assert_eq!(core["kind"], "release");
  assert_eq!(core["release_version"], "3.2.0");
  assert_eq!(core["development_version"], "3.2-SNAPSHOT");

  // Nothing configured: unreleased modules outside the set have no reference version
  let tools = &plan["assignments"][key("tools").as_str()];
  assert_eq!(tools["kind"], "reference");
  assert_eq!(tools["reference"]["status"], "not_yet_released");

  let order: Vec<&str> = plan["release_order"]
    .as_array()
    .expect("release order")
    .iter()
    .filter_map(|k| k.as_str())
    .collect();
  let position = |name: &str| order.iter().position(|k| *k == key(name)).expect("module in order");
  assert!(position("core") < position("app"));

  Ok(())
}

#[test]
fn test_release_plan_complete_selection_with_versions() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain(
    &project.path,
    &[
      "release",
      "plan",
      "--select",
      "org.acme:parent",
      "org.acme:core",
      "org.acme:app",
      "--release-version",
      "org.acme:core=3.2.7",
    ],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Release plan: minor"));
  assert!(stdout.contains("-Dproject.rel.org.acme:core=3.2.7"));
  assert!(stdout.contains("-Dproject.dev.org.acme:core=3.2-SNAPSHOT"));
  assert!(stdout.contains("-DignoreSnapshots=true"));
  assert!(stdout.contains("--projects"));
  assert!(stdout.contains("release:prepare release:perform"));

  Ok(())
}

#[test]
fn test_release_plan_uses_local_registry() -> Result<()> {
  let project = TestProject::new()?;
  project.use_local_registry()?;
  project.publish("tools", &["3.1.9", "3.2.1", "3.2.5", "3.3.0"])?;
  project.publish("core", &["3.2.5"])?;

  let output = run_modtrain(
    &project.path,
    &["release", "plan", "--select", "org.acme:core", "--auto-expand", "--json"],
  )?;
  let plan = stdout_json(&output)?;

  let tools = &plan["assignments"][key("tools").as_str()];
  assert_eq!(tools["reference"]["status"], "published");
  assert_eq!(tools["reference"]["version"], "3.2.5");

  // Suggested release follows the latest published version of the line
  assert_eq!(plan["assignments"][key("core").as_str()]["release_version"], "3.2.6");

  assert_eq!(plan["command"]["overrides"][key("tools").as_str()]["release_version"], "3.2.5");
  assert!(plan["registry_failures"].as_array().is_some_and(|f| f.is_empty()));

  Ok(())
}

#[test]
fn test_release_plan_unknown_module_fails() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain_unchecked(&project.path, &["release", "plan", "--select", "org.acme:nope"])?;

  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("org.acme:nope"));

  Ok(())
}

#[test]
fn test_release_plan_rejects_malformed_version_override() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain_unchecked(
    &project.path,
    &["release", "plan", "--select", "org.acme:tools", "--release-version", "org.acme:tools"],
  )?;

  assert!(!output.status.success());

  Ok(())
}

#[test]
fn test_release_major_defaults_to_root_major_line() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain(&project.path, &["release", "major", "--json"])?;
  let plan = stdout_json(&output)?;

  assert_eq!(plan["kind"], "major");
  assert_eq!(plan["command"]["tag"], "1.0.0");
  assert_eq!(plan["command"]["versions"]["release_version"], "1.0.0");
  assert_eq!(plan["command"]["versions"]["development_version"], "1.0-SNAPSHOT");

  let assignments = plan["assignments"].as_object().expect("assignments");
  assert_eq!(assignments.len(), 4);
  assert!(assignments.values().all(|a| a["release_version"] == "1.0.0"));

  Ok(())
}

#[test]
fn test_release_major_continues_after_published_root() -> Result<()> {
  let project = TestProject::new()?;
  project.use_local_registry()?;
  project.publish("parent", &["1.0.0", "1.0.3"])?;

  let output = run_modtrain(&project.path, &["release", "major", "--json"])?;
  let plan = stdout_json(&output)?;

  assert_eq!(plan["command"]["versions"]["release_version"], "1.0.4");
  assert_eq!(plan["command"]["tag"], "1.0.4");

  Ok(())
}

#[test]
fn test_release_major_explicit_version() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain(&project.path, &["release", "major", "--release-version", "2.0.0"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("--batch-mode"));
  assert!(stdout.contains("-Dtag=2.0.0"));
  assert!(stdout.contains("-DreleaseVersion=2.0.0"));
  assert!(stdout.contains("-DdevelopmentVersion=1.0-SNAPSHOT"));

  Ok(())
}

#[test]
fn test_release_initialize_and_cleanup() -> Result<()> {
  let project = TestProject::empty()?;

  let output = run_modtrain(&project.path, &["release", "initialize", "--json"])?;
  let plan = stdout_json(&output)?;
  assert_eq!(plan["kind"], "initialize");

  let output = run_modtrain(&project.path, &["release", "initialize"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("install"));

  let output = run_modtrain(&project.path, &["release", "cleanup"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("release:rollback"));

  Ok(())
}

#[test]
fn test_release_plan_id_is_stable() -> Result<()> {
  let project = TestProject::new()?;
  let args = ["release", "plan", "--select", "org.acme:tools", "--json"];

  let first = stdout_json(&run_modtrain(&project.path, &args)?)?;
  let second = stdout_json(&run_modtrain(&project.path, &args)?)?;

  assert_eq!(first["id"], second["id"]);

  Ok(())
}
