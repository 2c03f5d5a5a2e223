use clap::{ArgAction, Parser, Subcommand};
use modtrain::commands;
use modtrain::core::context::ReleaseContext;
use modtrain::core::error::{TrainError, TrainResult, print_error};
use modtrain::graph::ModuleKey;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "MODTRAIN_LOG";

/// Plan releases of multi-module projects
#[derive(Parser)]
#[command(name = "modtrain")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  /// Run as if started in this directory
  #[arg(short = 'C', long = "directory", global = true, value_name = "DIR")]
  directory: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Inspection
  // ============================================================================
  /// Show modules with their parents, dependencies and dependents
  Graph {
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show every module that transitively depends on a module
  Dependents {
    /// Module key (<namespace>:<name>)
    #[arg(value_parser = parse_module_key)]
    module: ModuleKey,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Show whether the project is initialized and clean
  Status {
    /// Output status in JSON format
    #[arg(long)]
    json: bool,
  },

  // ============================================================================
  // Releases
  // ============================================================================
  /// Release planning and command composition
  #[command(subcommand)]
  Release(ReleaseCommands),
}

#[derive(Subcommand)]
enum ReleaseCommands {
  /// Plan a release of selected modules
  Plan {
    /// Modules to release (<namespace>:<name>), repeatable
    #[arg(long = "select", required = true, num_args = 1.., value_parser = parse_module_key)]
    select: Vec<ModuleKey>,
    /// Add modules the selection is missing instead of failing
    #[arg(long)]
    auto_expand: bool,
    /// Release version for a module (<namespace>:<name>=<version>), repeatable
    #[arg(
      long = "release-version",
      value_name = "KEY=VERSION",
      value_parser = commands::release::parse_version_override
    )]
    versions: Vec<(ModuleKey, String)>,
    /// Output plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Plan a release of the whole project under one version
  Major {
    /// Release version (default: next unpublished version of the root's major line)
    #[arg(long = "release-version", value_name = "VERSION")]
    release_version: Option<String>,
    /// Output plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Compose the command that installs the project before its first release
  Initialize {
    /// Output plan in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Compose the command that rolls back a failed release
  Cleanup {
    /// Output plan in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn parse_module_key(s: &str) -> Result<ModuleKey, String> {
  s.parse().map_err(|e: TrainError| e.to_string())
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(verbose: u8) {
  let level_filter = match verbose {
    0 => LevelFilter::WARN,
    1 => LevelFilter::INFO,
    2 => LevelFilter::DEBUG,
    _ => LevelFilter::TRACE,
  };

  let env_filter = EnvFilter::builder()
    .with_default_directive(level_filter.into())
    .with_env_var(LOG_ENV)
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .without_time()
    .try_init();
}

fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let project_dir = match cli.directory {
    Some(dir) => dir,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => handle_error(TrainError::Io(e)),
    },
  };

  if let Err(err) = run(cli.command, &project_dir) {
    handle_error(err);
  }
}

fn run(command: Commands, project_dir: &Path) -> TrainResult<()> {
  match command {
    // Status works before the project has a root descriptor
    Commands::Status { json } => commands::run_status(project_dir, json),
    Commands::Graph { json } => commands::run_graph(&ReleaseContext::build(project_dir)?, json),
    Commands::Dependents { module, json } => {
      commands::run_dependents(&ReleaseContext::build(project_dir)?, &module, json)
    }
    Commands::Release(release_cmd) => match release_cmd {
      ReleaseCommands::Plan {
        select,
        auto_expand,
        versions,
        json,
      } => commands::run_release_plan(&ReleaseContext::build(project_dir)?, select, auto_expand, versions, json),
      ReleaseCommands::Major { release_version, json } => {
        commands::run_release_major(&ReleaseContext::build(project_dir)?, release_version, json)
      }
      ReleaseCommands::Initialize { json } => commands::run_release_initialize(json),
      ReleaseCommands::Cleanup { json } => commands::run_release_cleanup(json),
    },
  }
}

fn handle_error(err: TrainError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
