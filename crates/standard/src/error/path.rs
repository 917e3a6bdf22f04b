use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by path normalization, glob expansion, and JSON reading.
#[derive(Debug, Error, Clone)]
pub enum PathError {
    /// A path that should exist on disk does not.
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    /// A glob pattern failed to compile.
    #[error("invalid glob pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },

    /// A file could not be read.
    #[error("failed to read {path}: {reason}")]
    ReadFailed {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying OS error message.
        reason: String,
    },

    /// A file's contents could not be parsed as JSON.
    #[error("failed to parse {path} as JSON: {reason}")]
    InvalidJson {
        /// The file that failed to parse.
        path: PathBuf,
        /// The underlying parse error message.
        reason: String,
    },
}
