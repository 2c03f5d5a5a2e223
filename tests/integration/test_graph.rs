//! Integration tests for `modtrain graph` and `modtrain dependents`

use crate::helpers::{TestProject, key, run_modtrain, run_modtrain_unchecked, stdout_json};
use anyhow::Result;

#[test]
fn test_graph_json_lists_every_module() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain(&project.path, &["graph", "--json"])?;
  let report = stdout_json(&output)?;

  assert_eq!(report["root"], key("parent"));

  let modules = report["modules"].as_array().expect("modules array");
  let keys: Vec<&str> = modules.iter().filter_map(|m| m["key"].as_str()).collect();
  assert_eq!(keys.len(), 4);
  for name in ["parent", "core", "app", "tools"] {
    assert!(keys.contains(&key(name).as_str()), "missing {} in {:?}", name, keys);
  }

  let core = modules.iter().find(|m| m["key"] == key("core")).expect("core module");
  assert_eq!(core["version"], "3.2-SNAPSHOT");
  assert_eq!(core["parent"], key("parent"));
  assert_eq!(core["dependents"], serde_json::json!([key("app")]));

  assert!(report["cycles"].as_array().is_some_and(|c| c.is_empty()));

  Ok(())
}

#[test]
fn test_graph_text_output() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain(&project.path, &["graph"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("Root: org.acme:parent"));
  assert!(stdout.contains("depends on: org.acme:core"));

  Ok(())
}

#[test]
fn test_graph_reports_dependency_cycles() -> Result<()> {
  let project = TestProject::empty()?;
  project.write_file(
    "module.toml",
    "[module]\nnamespace = \"org.acme\"\nname = \"parent\"\nversion = \"1.0\"\nmodules = [\"a\", \"b\"]\n",
  )?;
  project.add_module("a", "1.0", Some("parent"), &["b"])?;
  project.add_module("b", "1.0", Some("parent"), &["a"])?;

  let output = run_modtrain(&project.path, &["graph", "--json"])?;
  let report = stdout_json(&output)?;

  let cycles = report["cycles"].as_array().expect("cycles array");
  assert_eq!(cycles.len(), 1);

  Ok(())
}

#[test]
fn test_graph_without_root_descriptor_fails() -> Result<()> {
  let project = TestProject::empty()?;

  let output = run_modtrain_unchecked(&project.path, &["graph"])?;
  assert!(!output.status.success());

  Ok(())
}

#[test]
fn test_dependents_json() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain(&project.path, &["dependents", "org.acme:core", "--json"])?;
  let report = stdout_json(&output)?;

  assert_eq!(report["module"], key("core"));
  assert_eq!(report["dependents"], serde_json::json!([key("app")]));

  Ok(())
}

#[test]
fn test_dependents_of_unknown_module_fails() -> Result<()> {
  let project = TestProject::new()?;

  let output = run_modtrain_unchecked(&project.path, &["dependents", "org.acme:nope"])?;
  assert!(!output.status.success());

  Ok(())
}

#[test]
fn test_directory_flag() -> Result<()> {
  let project = TestProject::new()?;
  let elsewhere = TestProject::empty()?;

  let dir = project.path.to_string_lossy().to_string();
  let output = run_modtrain(&elsewhere.path, &["-C", &dir, "dependents", "org.acme:core"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("org.acme:app"));

  Ok(())
}
