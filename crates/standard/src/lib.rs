//! # `wiggum_standard_tools`
//!
//! Ambient primitives shared by the wiggum workspace runner.
//!
//! ## What
//! This crate has no knowledge of workspaces, manifests, or task graphs. It
//! provides the three things every layer above it needs: a composite error
//! type, filesystem/glob path utilities, and an async subprocess executor.
//!
//! ## How
//! - **`error`**: per-domain `thiserror` enums (`PathError`, `CommandError`)
//!   aggregated into one `Error`/`Result` pair.
//! - **`path`**: path normalization, glob expansion with a `<rootDir>` token,
//!   and JSON file reading.
//! - **`command`**: an `Executor` trait with a `tokio`-backed implementation
//!   that can either capture a child's output or stream it straight through.
//!
//! ## Why
//! Keeping these concerns out of `wiggum_runner` lets the runner's own code
//! stay about the workspace domain model, not about spawning processes or
//! walking directories.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::panic)]

pub mod command;
pub mod error;
pub mod path;

/// Version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the version of the crate.
#[must_use]
pub fn version() -> &'static str {
    VERSION
}
