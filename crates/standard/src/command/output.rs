use std::time::Duration;

/// Captured result of a subprocess run to completion.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code. `-1` if the child was terminated by a signal.
    pub code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock time spent waiting on the child.
    pub duration: Duration,
}

impl CommandOutput {
    /// Builds a new captured output record.
    #[must_use]
    pub fn new(code: i32, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            code,
            stdout,
            stderr,
            duration,
        }
    }

    /// Whether the process exited successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}
