//! Core building blocks shared by every modtrain operation
//!
//! - **config**: train.toml parsing and validation
//! - **context**: project context built once and passed to commands
//! - **error**: error types with contextual help messages
//! - **plan**: content-addressed plan identifiers

pub mod config;
pub mod context;
pub mod error;
pub mod plan;
