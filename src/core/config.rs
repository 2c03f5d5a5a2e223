use crate::core::error::{ConfigError, TrainResult, ResultExt};
use crate::descriptor::toml::DEFAULT_DESCRIPTOR_FILE;
use crate::registry::Credentials;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `[registry] username`
pub const REGISTRY_USERNAME_ENV: &str = "MODTRAIN_REGISTRY_USERNAME";
/// Environment variable overriding `[registry] password`
pub const REGISTRY_PASSWORD_ENV: &str = "MODTRAIN_REGISTRY_PASSWORD";

/// Configuration for modtrain
/// Searched in order: train.toml, .train.toml, .config/train.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainConfig {
  #[serde(default)]
  pub project: ProjectConfig,
  #[serde(default)]
  pub registry: RegistryConfig,
  #[serde(default)]
  pub release: ReleaseConfig,
}

/// Where the module tree lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
  /// Directory of the root descriptor, relative to the config file's directory
  #[serde(default = "default_root")]
  pub root: PathBuf,

  /// Descriptor file name inside every module directory
  #[serde(default = "default_descriptor")]
  pub descriptor: String,
}

fn default_root() -> PathBuf {
  PathBuf::from(".")
}

fn default_descriptor() -> String {
  DEFAULT_DESCRIPTOR_FILE.to_string()
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      root: default_root(),
      descriptor: default_descriptor(),
    }
  }
}

impl ProjectConfig {
  /// Directory holding the root descriptor
  pub fn root_dir(&self, project_dir: &Path) -> PathBuf {
    project_dir.join(&self.root)
  }

  /// Path of the root descriptor file
  pub fn root_descriptor(&self, project_dir: &Path) -> PathBuf {
    self.root_dir(project_dir).join(&self.descriptor)
  }
}

/// Artifact registry used to look up published versions
///
/// ```toml
/// [registry]
/// url = "https://repo.example.com/releases"   # or: path = "repo"
/// username = "ci"
/// timeout_secs = 30
/// parallel = true
/// strict = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
  /// HTTP repository base URL
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,

  /// Local repository directory
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,

  /// Per-query timeout
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,

  /// Query the registry for several modules at once
  #[serde(default = "default_true")]
  pub parallel: bool,

  /// Abort on the first failed lookup instead of recording it
  #[serde(default)]
  pub strict: bool,
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_true() -> bool {
  true
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      url: None,
      path: None,
      username: None,
      password: None,
      timeout_secs: default_timeout_secs(),
      parallel: true,
      strict: false,
    }
  }
}

impl RegistryConfig {
  /// Validate registry configuration
  pub fn validate(&self) -> TrainResult<()> {
    if self.url.is_some() && self.path.is_some() {
      return Err(invalid("registry", "`url` and `path` are mutually exclusive"));
    }

    if let Some(url) = &self.url
      && !(url.starts_with("http://") || url.starts_with("https://"))
    {
      return Err(invalid("registry.url", format!("'{}' is not an http(s) URL", url)));
    }

    if self.timeout_secs == 0 {
      return Err(invalid("registry.timeout_secs", "must be greater than 0"));
    }

    if self.password.is_some() && self.username.is_none() {
      return Err(invalid("registry.password", "a password requires a username"));
    }

    Ok(())
  }

  /// Whether any registry is configured
  pub fn is_configured(&self) -> bool {
    self.url.is_some() || self.path.is_some()
  }

  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }

  pub fn credentials(&self) -> Option<Credentials> {
    self.username.as_ref().map(|username| Credentials {
      username: username.clone(),
      password: self.password.clone(),
    })
  }

  /// Take credentials from the environment when set there
  pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(username) = lookup(REGISTRY_USERNAME_ENV).filter(|v| !v.is_empty()) {
      self.username = Some(username);
    }
    if let Some(password) = lookup(REGISTRY_PASSWORD_ENV).filter(|v| !v.is_empty()) {
      self.password = Some(password);
    }
  }
}

/// Release behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
  /// Add missing modules to a selection instead of failing
  #[serde(default)]
  pub auto_expand: bool,

  /// Refuse release sets that touch a dependency cycle
  #[serde(default)]
  pub reject_dependency_cycles: bool,

  /// Extra arguments appended to composed release commands
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub extra_args: Vec<String>,
}

fn invalid(field: &str, reason: impl Into<String>) -> crate::core::error::TrainError {
  ConfigError::InvalidField {
    field: field.to_string(),
    reason: reason.into(),
  }
  .into()
}

impl TrainConfig {
  /// Find config file in search order: train.toml, .train.toml, .config/train.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("train.toml"),
      path.join(".train.toml"),
      path.join(".config").join("train.toml"),
    ];

    candidates.into_iter().find(|p| p.is_file())
  }

  /// Load config for a project directory; defaults when no config file exists.
  ///
  /// Registry credentials from the environment override the file.
  pub fn load(path: &Path) -> TrainResult<Self> {
    let mut config = match Self::find_config_path(path) {
      Some(config_path) => Self::load_file(&config_path)?,
      None => Self::default(),
    };
    config.registry.apply_env_overrides(|name| env::var(name).ok());
    config.validate()?;
    Ok(config)
  }

  /// Parse one config file without looking at the environment
  pub fn load_file(config_path: &Path) -> TrainResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    Self::parse(config_path, &content)
  }

  pub fn parse(config_path: &Path, content: &str) -> TrainResult<Self> {
    toml_edit::de::from_str(content).map_err(|e| {
      ConfigError::Parse {
        path: config_path.to_path_buf(),
        reason: e.to_string(),
      }
      .into()
    })
  }

  pub fn validate(&self) -> TrainResult<()> {
    if self.project.descriptor.trim().is_empty() {
      return Err(invalid("project.descriptor", "must not be empty"));
    }
    self.registry.validate()
  }

  /// Save config to train.toml
  pub fn save(&self, path: &Path) -> TrainResult<()> {
    let config_path = path.join("train.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }
}
