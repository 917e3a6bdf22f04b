use thiserror::Error;

/// Errors raised while spawning or waiting on a subprocess.
#[derive(Debug, Error, Clone)]
pub enum CommandError {
    /// The child process could not be spawned at all (binary not found, etc).
    #[error("failed to spawn `{program}`: {reason}")]
    SpawnFailed {
        /// The program that failed to start.
        program: String,
        /// The underlying OS error message.
        reason: String,
    },

    /// The child process exited with a non-zero status.
    #[error("`{program}` exited with code {code}")]
    NonZeroExit {
        /// The program that failed.
        program: String,
        /// The process's exit code, or -1 if it was killed by a signal.
        code: i32,
        /// Captured stderr, when the caller asked for captured output.
        stderr: Option<String>,
    },

    /// Waiting on the child process failed (I/O error on its pipes, etc).
    #[error("failed to wait on `{program}`: {reason}")]
    WaitFailed {
        /// The program being waited on.
        program: String,
        /// The underlying OS error message.
        reason: String,
    },
}
