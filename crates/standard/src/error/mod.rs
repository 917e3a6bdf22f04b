//! # Error handling for `wiggum_standard_tools`
//!
//! ## What
//! Small per-domain `thiserror` enums, aggregated into one composite `Error`
//! so callers that cross domains (a path failure while building a command,
//! say) can propagate a single type with `?`.
//!
//! ## How
//! Each domain owns its enum (`PathError`, `CommandError`); `Error` wraps
//! them with `#[from]` and adds an `Operation` catch-all for ad hoc
//! failures that don't deserve their own variant.

mod command;
mod path;

pub use command::CommandError;
pub use path::PathError;

use core::result::Result as CoreResult;
use thiserror::Error as ThisError;

/// Composite error type for the standard tools crate.
#[derive(ThisError, Debug, Clone)]
pub enum Error {
    /// Path or glob-expansion error.
    #[error("path error: {0}")]
    Path(#[from] PathError),
    /// Subprocess execution error.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
    /// General purpose error with a custom message.
    #[error("operation error: {0}")]
    Operation(String),
}

impl Error {
    /// Creates a new operational error.
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation(message.into())
    }
}

impl AsRef<str> for Error {
    fn as_ref(&self) -> &str {
        match self {
            Error::Path(_) => "Error::Path",
            Error::Command(_) => "Error::Command",
            Error::Operation(_) => "Error::Operation",
        }
    }
}

/// Result type for the standard tools crate.
pub type Result<T> = CoreResult<T, Error>;
