//! Error types for modtrain with contextual messages and exit codes
//!
//! Every failure a resolution request can hit is categorized here. Each
//! category knows its exit code and, where one exists, a suggestion that tells
//! the user how to get unstuck.

use crate::graph::ModuleKey;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for modtrain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, malformed descriptors or versions)
  User = 1,
  /// System error (registry, I/O)
  System = 2,
  /// Validation failure (incomplete release set, cycles)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for modtrain
#[derive(Debug)]
pub enum TrainError {
  /// Descriptor could not be found or parsed
  Descriptor(DescriptorError),

  /// Release set is incomplete and auto-expansion is disabled
  MissingModules { modules: Vec<ModuleKey> },

  /// A cycle was found where the graph must be acyclic
  Cycle(CycleError),

  /// Artifact registry communication failed
  Registry(RegistryError),

  /// Version string has no incrementable numeric segment
  InvalidVersion {
    version: String,
    module: Option<ModuleKey>,
  },

  /// Configuration errors
  Config(ConfigError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl TrainError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    TrainError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    TrainError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Create an invalid version error, optionally attributed to a module
  pub fn invalid_version(version: impl Into<String>, module: Option<&ModuleKey>) -> Self {
    TrainError::InvalidVersion {
      version: version.into(),
      module: module.cloned(),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      TrainError::Message { message, context, help } => TrainError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      TrainError::Descriptor(_) => ExitCode::User,
      TrainError::MissingModules { .. } => ExitCode::Validation,
      TrainError::Cycle(_) => ExitCode::Validation,
      TrainError::Registry(_) => ExitCode::System,
      TrainError::InvalidVersion { .. } => ExitCode::User,
      TrainError::Config(_) => ExitCode::User,
      TrainError::Io(_) => ExitCode::System,
      TrainError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      TrainError::Descriptor(e) => e.help_message(),
      TrainError::MissingModules { .. } => Some(
        "Add the listed modules to the selection, or re-run with --auto-expand to include them automatically."
          .to_string(),
      ),
      TrainError::Cycle(e) => e.help_message(),
      TrainError::Registry(e) => e.help_message(),
      TrainError::InvalidVersion { .. } => {
        Some("Versions must end in a numeric segment, e.g. '1.4.2' or '2.0'.".to_string())
      }
      TrainError::Config(e) => e.help_message(),
      TrainError::Message { help, .. } => help.clone(),
      TrainError::Io(_) => None,
    }
  }

  /// Missing modules carried by a `MissingModules` error
  pub fn missing_modules(&self) -> Option<&[ModuleKey]> {
    match self {
      TrainError::MissingModules { modules } => Some(modules),
      _ => None,
    }
  }
}

impl fmt::Display for TrainError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TrainError::Descriptor(e) => write!(f, "{}", e),
      TrainError::MissingModules { modules } => {
        let list: Vec<String> = modules.iter().map(ToString::to_string).collect();
        write!(f, "Release set is incomplete. Missing modules: {}", list.join(","))
      }
      TrainError::Cycle(e) => write!(f, "{}", e),
      TrainError::Registry(e) => write!(f, "{}", e),
      TrainError::InvalidVersion { version, module } => match module {
        Some(key) => write!(f, "Invalid version '{}' for module {}", version, key),
        None => write!(f, "Invalid version '{}'", version),
      },
      TrainError::Config(e) => write!(f, "{}", e),
      TrainError::Io(e) => write!(f, "I/O error: {}", e),
      TrainError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for TrainError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      TrainError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for TrainError {
  fn from(err: io::Error) -> Self {
    TrainError::Io(err)
  }
}

impl From<String> for TrainError {
  fn from(msg: String) -> Self {
    TrainError::message(msg)
  }
}

impl From<&str> for TrainError {
  fn from(msg: &str) -> Self {
    TrainError::message(msg)
  }
}

impl From<DescriptorError> for TrainError {
  fn from(err: DescriptorError) -> Self {
    TrainError::Descriptor(err)
  }
}

impl From<CycleError> for TrainError {
  fn from(err: CycleError) -> Self {
    TrainError::Cycle(err)
  }
}

impl From<RegistryError> for TrainError {
  fn from(err: RegistryError) -> Self {
    TrainError::Registry(err)
  }
}

impl From<ConfigError> for TrainError {
  fn from(err: ConfigError) -> Self {
    TrainError::Config(err)
  }
}

impl From<toml_edit::TomlError> for TrainError {
  fn from(err: toml_edit::TomlError) -> Self {
    TrainError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for TrainError {
  fn from(err: toml_edit::de::Error) -> Self {
    TrainError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for TrainError {
  fn from(err: toml_edit::ser::Error) -> Self {
    TrainError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for TrainError {
  fn from(err: serde_json::Error) -> Self {
    TrainError::message(format!("JSON error: {}", err))
  }
}

/// Descriptor-related errors (`DescriptorParseError`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
  /// Root descriptor does not exist
  NotFound { path: PathBuf },

  /// Descriptor exists but could not be read or parsed
  Malformed { path: PathBuf, reason: String },
}

impl DescriptorError {
  /// Path of the offending descriptor
  pub fn path(&self) -> &PathBuf {
    match self {
      DescriptorError::NotFound { path } | DescriptorError::Malformed { path, .. } => path,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      DescriptorError::NotFound { .. } => Some(
        "Check out the project first, or point `[project] root` in train.toml at the directory holding the root descriptor."
          .to_string(),
      ),
      DescriptorError::Malformed { .. } => {
        Some("Every descriptor needs a [module] table with at least `name`; namespace and version may be inherited from [parent].".to_string())
      }
    }
  }
}

impl fmt::Display for DescriptorError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DescriptorError::NotFound { path } => write!(f, "Descriptor not found: {}", path.display()),
      DescriptorError::Malformed { path, reason } => {
        write!(f, "Malformed descriptor {}: {}", path.display(), reason)
      }
    }
  }
}

/// Cycle errors (`CyclicGraphError`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
  /// Parent links loop back onto a module already on the chain
  Parent { chain: Vec<ModuleKey> },

  /// Dependency edges form a strongly connected component
  Dependency { members: Vec<ModuleKey> },
}

impl CycleError {
  fn help_message(&self) -> Option<String> {
    match self {
      CycleError::Parent { .. } => Some("Fix the [parent] entries so the containment hierarchy is a tree.".to_string()),
      CycleError::Dependency { .. } => Some(
        "Break the dependency cycle, or set `reject_dependency_cycles = false` under [release] to release the cycle as one unit."
          .to_string(),
      ),
    }
  }
}

impl fmt::Display for CycleError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CycleError::Parent { chain } => {
        let chain: Vec<String> = chain.iter().map(ToString::to_string).collect();
        write!(f, "Parent cycle detected: {}", chain.join(" -> "))
      }
      CycleError::Dependency { members } => {
        let members: Vec<String> = members.iter().map(ToString::to_string).collect();
        write!(f, "Dependency cycle detected between: {}", members.join(", "))
      }
    }
  }
}

/// Artifact registry errors (`RegistryError`)
///
/// Only communication failures land here. "No published version" is not an
/// error and is reported as `Ok(None)` by registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
  /// Registry could not be reached at all
  Unreachable { location: String, reason: String },

  /// Credentials missing or rejected
  Unauthorized { location: String },

  /// Unexpected HTTP status
  Status { location: String, status: u16 },

  /// Local repository could not be read
  Io { location: String, reason: String },

  /// Response body could not be understood
  InvalidResponse { location: String, reason: String },
}

impl RegistryError {
  fn help_message(&self) -> Option<String> {
    match self {
      RegistryError::Unreachable { .. } => {
        Some("Check `[registry] url` / `path` in train.toml and your network connection.".to_string())
      }
      RegistryError::Unauthorized { .. } => Some(
        "Set `[registry] username`/`password` or MODTRAIN_REGISTRY_USERNAME/MODTRAIN_REGISTRY_PASSWORD.".to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for RegistryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RegistryError::Unreachable { location, reason } => {
        write!(f, "Registry unreachable at {}: {}", location, reason)
      }
      RegistryError::Unauthorized { location } => write!(f, "Registry rejected credentials at {}", location),
      RegistryError::Status { location, status } => {
        write!(f, "Registry returned HTTP {} for {}", status, location)
      }
      RegistryError::Io { location, reason } => write!(f, "Failed to read repository {}: {}", location, reason),
      RegistryError::InvalidResponse { location, reason } => {
        write!(f, "Invalid registry response from {}: {}", location, reason)
      }
    }
  }
}

impl std::error::Error for RegistryError {}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Field holds a value that cannot be used
  InvalidField { field: String, reason: String },

  /// Config file could not be parsed
  Parse { path: PathBuf, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::InvalidField { .. } => Some("Fix the value in train.toml or the matching CLI flag.".to_string()),
      ConfigError::Parse { .. } => Some("train.toml must be valid TOML; see the [project], [registry] and [release] sections.".to_string()),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidField { field, reason } => write!(f, "Invalid config field '{}': {}", field, reason),
      ConfigError::Parse { path, reason } => write!(f, "Failed to parse {}: {}", path.display(), reason),
    }
  }
}

/// Result type alias for modtrain
pub type TrainResult<T> = Result<T, TrainError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> TrainResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> TrainResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<TrainError>,
{
  fn context(self, ctx: impl Into<String>) -> TrainResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> TrainResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &TrainError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
