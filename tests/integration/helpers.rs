//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const NAMESPACE: &str = "org.acme";

/// A throwaway multi-module project on disk
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestProject {
  /// Create an empty project directory
  pub fn empty() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Create the standard fixture:
  ///
  /// ```text
  /// parent (1.0-SNAPSHOT)
  /// ├── core  (3.2-SNAPSHOT)
  /// ├── app   (1.0-SNAPSHOT, depends on core)
  /// └── tools (3.2-SNAPSHOT, no parent)
  /// ```
  pub fn new() -> Result<Self> {
    let project = Self::empty()?;

    project.write_file(
      "module.toml",
      &format!(
        r#"[module]
namespace = "{ns}"
name = "parent"
version = "1.0-SNAPSHOT"
modules = ["core", "app", "tools"]
"#,
        ns = NAMESPACE
      ),
    )?;

    project.add_module("core", "3.2-SNAPSHOT", Some("parent"), &[])?;
    project.add_module("app", "1.0-SNAPSHOT", Some("parent"), &["core"])?;
    project.add_module("tools", "3.2-SNAPSHOT", None, &[])?;

    Ok(project)
  }

  /// Add a module directory with a descriptor
  pub fn add_module(&self, name: &str, version: &str, parent: Option<&str>, deps: &[&str]) -> Result<PathBuf> {
    let mut content = format!(
      "[module]\nnamespace = \"{}\"\nname = \"{}\"\nversion = \"{}\"\n",
      NAMESPACE, name, version
    );

    if let Some(parent) = parent {
      content.push_str(&format!("\n[parent]\nnamespace = \"{}\"\nname = \"{}\"\n", NAMESPACE, parent));
    }

    for dep in deps {
      content.push_str(&format!("\n[[dependencies]]\nname = \"{}\"\n", dep));
    }

    self.write_file(&format!("{}/module.toml", name), &content)?;
    Ok(self.path.join(name))
  }

  /// Publish versions of a module into a local registry under `repo/`
  pub fn publish(&self, name: &str, versions: &[&str]) -> Result<()> {
    for version in versions {
      let dir = self
        .path
        .join("repo")
        .join(NAMESPACE.replace('.', "/"))
        .join(name)
        .join(version);
      std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
  }

  /// Point the project at its local `repo/` registry
  pub fn use_local_registry(&self) -> Result<()> {
    self.write_file("train.toml", "[registry]\npath = \"repo\"\nparallel = false\n")
  }

  /// Write a file relative to the project root, creating parent directories
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let file = self.path.join(path);
    if let Some(dir) = file.parent() {
      std::fs::create_dir_all(dir)?;
    }
    std::fs::write(file, content)?;
    Ok(())
  }
}

/// Full module key within the fixture namespace
pub fn key(name: &str) -> String {
  format!("{}:{}", NAMESPACE, name)
}

/// Run the modtrain binary, returning its output whatever the exit status
pub fn run_modtrain_unchecked(cwd: &Path, args: &[&str]) -> Result<Output> {
  let modtrain_bin = env!("CARGO_BIN_EXE_modtrain");

  Command::new(modtrain_bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("MODTRAIN_LOG")
    .env_remove("MODTRAIN_REGISTRY_USERNAME")
    .env_remove("MODTRAIN_REGISTRY_PASSWORD")
    .output()
    .context("Failed to run modtrain")
}

/// Run the modtrain binary and fail unless it succeeds
pub fn run_modtrain(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_modtrain_unchecked(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "modtrain command failed: modtrain {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Parse stdout as JSON
pub fn stdout_json(output: &Output) -> Result<serde_json::Value> {
  serde_json::from_slice(&output.stdout).context("stdout is not valid JSON")
}
