//! CLI commands for modtrain
//!
//! ## Inspection
//! - **graph**: modules, dependencies and dependents of the project
//! - **dependents**: transitive dependents of one module
//! - **status**: whether the project is initialized and clean
//!
//! ## Releases
//! - **release**: plan minor and major releases, compose initialize/cleanup commands
//!
//! Commands that need the module graph accept `&ReleaseContext` to avoid redundant loads.

pub mod graph;
pub mod release;
pub mod status;

pub use graph::{run_dependents, run_graph};
pub use release::{run_release_cleanup, run_release_initialize, run_release_major, run_release_plan};
pub use status::run_status;
