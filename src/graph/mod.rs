//! Module graph analysis
//!
//! Built on petgraph for the forward graph, with our own types for everything
//! the release resolver asks about:
//!
//! - **module_graph**: descriptor tree → modules with dependency edges and parents
//! - **reverse_index**: dependency → dependents map
//! - **closure**: transitive dependents of a module (cycle-safe)

pub mod closure;
pub mod module_graph;
pub mod reverse_index;

pub use closure::transitive_dependents;
pub use module_graph::{Module, ModuleGraph, ModuleKey};
pub use reverse_index::ReverseDependencyIndex;
