//! An async subprocess executor with two modes: capture everything (used
//! for `--ai-prompt`/`--autofix` failure capture) or stream stdio straight
//! through to the parent process (the default, per §4.8/§5).

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use super::output::CommandOutput;
use crate::error::CommandError;

/// Everything needed to spawn one child process.
#[derive(Debug, Clone)]
pub struct CmdConfig {
    /// The program to invoke.
    pub program: String,
    /// Arguments passed to the program, in order.
    pub args: Vec<String>,
    /// Working directory for the child; inherits the parent's if `None`.
    pub cwd: Option<PathBuf>,
}

impl CmdConfig {
    /// Builds a new command configuration.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, cwd: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: Some(cwd),
        }
    }
}

/// Spawns a subprocess given `(tool, args, cwd)`, inheriting the parent
/// environment. The runner is agnostic to *how* the tool is located on
/// `PATH`; that resolution is left to the OS.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs the child to completion, capturing stdout/stderr rather than
    /// streaming them. Returns `Ok` even on a non-zero exit code — the
    /// caller decides what a failure means; only spawn/wait failures are
    /// `Err`.
    async fn execute_captured(&self, config: &CmdConfig) -> Result<CommandOutput, CommandError>;

    /// Runs the child to completion with stdio inherited from the parent,
    /// so output appears exactly as the child produced it. Returns the
    /// exit code (`-1` if the child was killed by a signal).
    async fn execute_streamed(&self, config: &CmdConfig) -> Result<i32, CommandError>;
}

/// Default [`Executor`] backed by `tokio::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCommandExecutor;

impl DefaultCommandExecutor {
    /// Builds a new executor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn build_command(config: &CmdConfig) -> Command {
        let mut command = Command::new(&config.program);
        command.args(&config.args);
        if let Some(cwd) = &config.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

#[async_trait]
impl Executor for DefaultCommandExecutor {
    async fn execute_captured(&self, config: &CmdConfig) -> Result<CommandOutput, CommandError> {
        let mut command = Self::build_command(config);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());

        let started = Instant::now();
        let child = command.spawn().map_err(|error| CommandError::SpawnFailed {
            program: config.program.clone(),
            reason: error.to_string(),
        })?;

        let output =
            child
                .wait_with_output()
                .await
                .map_err(|error| CommandError::WaitFailed {
                    program: config.program.clone(),
                    reason: error.to_string(),
                })?;

        Ok(CommandOutput::new(
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            started.elapsed(),
        ))
    }

    async fn execute_streamed(&self, config: &CmdConfig) -> Result<i32, CommandError> {
        let mut command = Self::build_command(config);
        command
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdin(Stdio::inherit());

        let mut child = command.spawn().map_err(|error| CommandError::SpawnFailed {
            program: config.program.clone(),
            reason: error.to_string(),
        })?;

        let status = child
            .wait()
            .await
            .map_err(|error| CommandError::WaitFailed {
                program: config.program.clone(),
                reason: error.to_string(),
            })?;

        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_captured_reports_exit_code_without_erroring() {
        let executor = DefaultCommandExecutor::new();
        let config = CmdConfig::new("sh", vec!["-c".into(), "exit 3".into()], PathBuf::from("."));
        let output = executor.execute_captured(&config).await.expect("run");
        assert_eq!(output.code, 3);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn execute_captured_collects_stdout() {
        let executor = DefaultCommandExecutor::new();
        let config = CmdConfig::new(
            "sh",
            vec!["-c".into(), "echo hello".into()],
            PathBuf::from("."),
        );
        let output = executor.execute_captured(&config).await.expect("run");
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn execute_streamed_reports_exit_code() {
        let executor = DefaultCommandExecutor::new();
        let config = CmdConfig::new("sh", vec!["-c".into(), "exit 0".into()], PathBuf::from("."));
        let code = executor.execute_streamed(&config).await.expect("run");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn execute_captured_reports_spawn_failure() {
        let executor = DefaultCommandExecutor::new();
        let config = CmdConfig::new(
            "definitely-not-a-real-binary",
            vec![],
            PathBuf::from("."),
        );
        let result = executor.execute_captured(&config).await;
        assert!(matches!(result, Err(CommandError::SpawnFailed { .. })));
    }
}
