//! modtrain: release planning for multi-module projects
//!
//! Reads a tree of module descriptors into a graph, closes a release selection
//! over dependents and ancestry, and assigns every module a version, using an
//! artifact registry for modules that are not part of the release.
//!
//! ```text
//! descriptor ──▶ graph ──▶ release::resolver ──▶ release::assigner ──▶ release::plan
//!                                                     ▲
//!                                                 registry
//! ```

pub mod commands;
pub mod core;
pub mod descriptor;
pub mod graph;
pub mod registry;
pub mod release;
pub mod ui;

pub use crate::core::error::{TrainError, TrainResult};
pub use crate::graph::{ModuleGraph, ModuleKey, ReverseDependencyIndex};
pub use crate::release::{ReleasePlan, ReleasePlanner, ReleaseSet, ReleaseSetResolver, VersionAssigner};
