//! Level-by-level executor (C8, execution half): runs a grouped plan with
//! bounded concurrency, cancelling further dispatch in a level on first
//! failure and never starting a later level. See spec §4.8 and §5.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use wiggum_standard_tools::command::{CmdConfig, Executor};

use crate::plan::ExecutionPlanEntry;

/// Per-project lifecycle within a run (spec §4.8's state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectState {
    /// Not yet dispatched.
    Pending,
    /// Waiting for a concurrency slot within its level.
    Queued,
    /// The child process is running.
    Running,
    /// The child exited zero.
    Succeeded,
    /// The child exited non-zero, or failed to spawn.
    Failed,
    /// Never started: a prior level failed first.
    Skipped,
}

/// Whether failing children's stdout/stderr are captured for the
/// remediation summary (`--ai-prompt`/`--autofix`) or streamed straight
/// through (the default, spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stream child stdio directly to the parent's.
    Stream,
    /// Capture stdout/stderr for the failure summary.
    Capture,
}

/// Bounded-concurrency execution knobs.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionOptions {
    /// Maximum number of projects running concurrently within one level.
    pub parallel: usize,
    /// Whether to capture or stream child stdio.
    pub output_mode: OutputMode,
}

/// One failed project's diagnostic record (spec §4.8's failure summary).
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    /// The project whose task failed.
    pub project: String,
    /// The resolved command line, for diagnostics.
    pub command: String,
    /// The process exit code (`-1` if spawn failed entirely).
    pub code: i32,
    /// Captured stdout, only present in [`OutputMode::Capture`].
    pub stdout: Option<String>,
    /// Captured stderr, only present in [`OutputMode::Capture`].
    pub stderr: Option<String>,
}

/// The outcome of a whole run across every level.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionSummary {
    /// Projects that completed successfully, in the order they finished.
    pub succeeded: Vec<String>,
    /// Failed projects, in execution (topological) order.
    pub failures: Vec<FailureRecord>,
    /// Projects never started because an earlier level failed.
    pub skipped: Vec<String>,
    /// Whether `Ctrl-C` (signal `INT`) was observed during this run (spec
    /// §5: the process must exit non-zero whenever this is true, even if
    /// every dispatched project still succeeded).
    pub cancelled: bool,
}

impl ExecutionSummary {
    /// Whether any project failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Whether the run should be reported as unsuccessful: either a
    /// project failed, or the run was interrupted (spec §5).
    #[must_use]
    pub fn is_unsuccessful(&self) -> bool {
        self.has_failures() || self.cancelled
    }
}

fn format_command(entry: &ExecutionPlanEntry) -> String {
    let mut parts = vec![entry.tool.clone()];
    parts.extend(entry.args.iter().cloned());
    parts.join(" ")
}

/// Runs `levels` to completion against `executor`, respecting `options`.
/// Between levels this is a barrier: the next level starts only once the
/// whole current level (everything already in flight) has finished. On
/// the first failure inside a level, no further project in that level is
/// dispatched, but everything already in flight is awaited to completion;
/// no later level starts at all. Everything not dispatched is recorded as
/// [`ProjectState::Skipped`].
pub async fn execute_levels(
    levels: &[Vec<ExecutionPlanEntry>],
    executor: Arc<dyn Executor + Send + Sync>,
    options: ExecutionOptions,
    task: &str,
    cancelled: &Arc<AtomicBool>,
) -> ExecutionSummary {
    let mut summary = ExecutionSummary::default();
    let mut abort = false;

    for level in levels {
        if abort || cancelled.load(Ordering::SeqCst) {
            summary.skipped.extend(level.iter().map(|e| e.project.clone()));
            continue;
        }

        let level_failed = Arc::new(AtomicBool::new(false));
        let semaphore = Arc::new(Semaphore::new(options.parallel.max(1)));
        let mut joins: JoinSet<(usize, Result<String, FailureRecord>)> = JoinSet::new();
        let mut skipped_in_level = Vec::new();
        let mut dispatched = 0usize;

        for entry in level {
            if level_failed.load(Ordering::SeqCst) || cancelled.load(Ordering::SeqCst) {
                skipped_in_level.push(entry.project.clone());
                continue;
            }

            info!("[runner] {task} -> {} ({})", entry.project, entry.cwd.display());

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                skipped_in_level.push(entry.project.clone());
                continue;
            };

            let index = dispatched;
            dispatched += 1;
            let entry = entry.clone();
            let executor = Arc::clone(&executor);
            let level_failed = Arc::clone(&level_failed);
            let output_mode = options.output_mode;

            joins.spawn(async move {
                let _permit = permit;
                let command = format_command(&entry);
                let config = CmdConfig::new(entry.tool.clone(), entry.args.clone(), entry.cwd.clone());

                let outcome = run_one(executor.as_ref(), &config, output_mode).await;
                let result = match outcome {
                    Ok((0, _, _)) => Ok(entry.project),
                    Ok((code, stdout, stderr)) => {
                        level_failed.store(true, Ordering::SeqCst);
                        Err(FailureRecord {
                            project: entry.project,
                            command,
                            code,
                            stdout,
                            stderr,
                        })
                    }
                    Err(_) => {
                        level_failed.store(true, Ordering::SeqCst);
                        Err(FailureRecord {
                            project: entry.project,
                            command,
                            code: -1,
                            stdout: None,
                            stderr: None,
                        })
                    }
                };
                (index, result)
            });
        }

        // `JoinSet` yields in completion order; re-sort by dispatch index
        // so the summary reports failures in topological (execution)
        // order, not in whichever order children happened to finish.
        let mut outcomes: Vec<(usize, Result<String, FailureRecord>)> = Vec::with_capacity(dispatched);
        while let Some(result) = joins.join_next().await {
            if let Ok(outcome) = result {
                outcomes.push(outcome);
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);
        for (_, outcome) in outcomes {
            match outcome {
                Ok(name) => summary.succeeded.push(name),
                Err(failure) => summary.failures.push(failure),
            }
        }
        summary.skipped.extend(skipped_in_level);

        if level_failed.load(Ordering::SeqCst) {
            abort = true;
        }
    }

    summary.cancelled = cancelled.load(Ordering::SeqCst);
    summary
}

async fn run_one(
    executor: &(dyn Executor + Send + Sync),
    config: &CmdConfig,
    mode: OutputMode,
) -> Result<(i32, Option<String>, Option<String>), wiggum_standard_tools::error::CommandError> {
    match mode {
        OutputMode::Stream => {
            let code = executor.execute_streamed(config).await?;
            Ok((code, None, None))
        }
        OutputMode::Capture => {
            let output = executor.execute_captured(config).await?;
            Ok((output.code, Some(output.stdout), Some(output.stderr)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wiggum_standard_tools::command::DefaultCommandExecutor;

    fn entry(project: &str, tool: &str, args: &[&str]) -> ExecutionPlanEntry {
        ExecutionPlanEntry {
            project: project.to_string(),
            cwd: PathBuf::from("."),
            tool: tool.to_string(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn all_succeed_reports_no_failures() {
        let levels = vec![vec![entry("a", "sh", &["-c", "exit 0"])]];
        let executor: Arc<dyn Executor + Send + Sync> = Arc::new(DefaultCommandExecutor::new());
        let cancelled = Arc::new(AtomicBool::new(false));
        let summary = execute_levels(
            &levels,
            Arc::clone(&executor),
            ExecutionOptions { parallel: 2, output_mode: OutputMode::Capture },
            "build",
            &cancelled,
        )
        .await;
        assert_eq!(summary.succeeded, vec!["a".to_string()]);
        assert!(!summary.has_failures());
    }

    #[tokio::test]
    async fn failure_in_level_skips_later_levels() {
        let levels = vec![
            vec![entry("a", "sh", &["-c", "exit 1"])],
            vec![entry("b", "sh", &["-c", "exit 0"])],
        ];
        let executor: Arc<dyn Executor + Send + Sync> = Arc::new(DefaultCommandExecutor::new());
        let cancelled = Arc::new(AtomicBool::new(false));
        let summary = execute_levels(
            &levels,
            Arc::clone(&executor),
            ExecutionOptions { parallel: 2, output_mode: OutputMode::Capture },
            "build",
            &cancelled,
        )
        .await;
        assert!(summary.has_failures());
        assert_eq!(summary.failures[0].project, "a");
        assert_eq!(summary.skipped, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn capture_mode_records_stdout_and_stderr() {
        let levels = vec![vec![entry("a", "sh", &["-c", "echo out; echo err >&2; exit 1"])]];
        let executor: Arc<dyn Executor + Send + Sync> = Arc::new(DefaultCommandExecutor::new());
        let cancelled = Arc::new(AtomicBool::new(false));
        let summary = execute_levels(
            &levels,
            Arc::clone(&executor),
            ExecutionOptions { parallel: 1, output_mode: OutputMode::Capture },
            "build",
            &cancelled,
        )
        .await;
        assert_eq!(summary.failures[0].stdout.as_deref(), Some("out\n"));
        assert_eq!(summary.failures[0].stderr.as_deref(), Some("err\n"));
    }

    #[tokio::test]
    async fn cancellation_is_unsuccessful_even_with_no_failures() {
        let levels = vec![
            vec![entry("a", "sh", &["-c", "exit 0"])],
            vec![entry("b", "sh", &["-c", "exit 0"])],
        ];
        let executor: Arc<dyn Executor + Send + Sync> = Arc::new(DefaultCommandExecutor::new());
        let cancelled = Arc::new(AtomicBool::new(true));
        let summary = execute_levels(
            &levels,
            Arc::clone(&executor),
            ExecutionOptions { parallel: 2, output_mode: OutputMode::Capture },
            "build",
            &cancelled,
        )
        .await;
        assert!(!summary.has_failures());
        assert!(summary.cancelled);
        assert!(summary.is_unsuccessful());
    }
}
