//! # `wiggum_cli`
//!
//! The `wiggum` binary: argument parsing, environment-variable overrides,
//! and dispatch into [`wiggum_runner`]'s discover → resolve → plan →
//! execute pipeline. See spec §6 for the full CLI surface.
//!
//! ## What
//! [`args`] hand-parses argv into a [`args::Command`] plus shared
//! [`args::RunnerOptions`]; [`env_overrides`] captures the two supported
//! environment variables once; [`run::dispatch`] wires both into the
//! runner and returns a process exit code; [`output`] renders the result
//! as either plain text or the stable dry-run JSON schema.
//!
//! ## How
//! Nothing below `main` ever calls `std::env::var` or `std::process::exit`
//! directly — `main.rs` is the only place either happens, so the rest of
//! this crate stays testable without a real process.
//!
//! ## Why
//! Keeping argument parsing, environment capture, and process exit
//! isolated to the edges is what lets [`run::dispatch`] be driven directly
//! from tests instead of only through `assert_cmd`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::panic)]

/// Hand-rolled argument parsing (spec §6).
pub mod args;
/// One-shot environment variable capture (SPEC_FULL §12).
pub mod env_overrides;
/// `CliError` and the exit-code mapping (spec §7).
pub mod error;
/// Logger initialization (SPEC_FULL §10).
pub mod logging;
/// Plain-text and JSON rendering of runner output.
pub mod output;
/// Dispatch from a parsed command into `wiggum_runner`.
pub mod run;
/// The closed-set task resolver the `wiggum` binary supplies.
pub mod tasks;

pub use error::{CliError, Result};
