//! Release planning over the module graph
//!
//! # Pipeline
//!
//! ```text
//! selection ──▶ resolver ──▶ ReleaseSet
//!                               │
//!                               ▼
//!            registry ──▶ assigner ──▶ VersionAssignments
//!                                          │
//!                                          ▼
//!                                     command ──▶ ReleasePlan
//! ```
//!
//! - **resolver**: closes a selection over dependents and ancestry
//! - **version**: version string arithmetic (next version, major line, ranges)
//! - **assigner**: release/development versions for the release set, reference
//!   versions for everything else
//! - **command**: release plugin invocation for each release kind
//! - **plan**: all of the above as one hashed, serializable plan

pub mod assigner;
pub mod command;
pub mod plan;
pub mod resolver;
pub mod version;

pub use assigner::{ReferenceVersion, VersionAssigner, VersionAssignment, VersionAssignments};
pub use command::{ReleaseCommand, ReleaseKind, VersionOverride};
pub use plan::{ReleasePlan, ReleasePlanner};
pub use resolver::{ReleaseSet, ReleaseSetAnalysis, ReleaseSetResolver, ResolveOptions};
pub use version::{VersionRange, next_version};
