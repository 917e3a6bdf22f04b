//! CLI-level errors (spec §6, §7): argument-parsing failures that never
//! reach `wiggum_runner`, plus the exit-code mapping for both this crate's
//! errors and [`wiggum_runner::RunnerError`].

use thiserror::Error;
use wiggum_runner::RunnerError;

/// Result type used throughout the CLI.
pub type Result<T> = core::result::Result<T, CliError>;

/// Errors raised while parsing argv, before the runner ever sees it.
#[derive(Debug, Error)]
pub enum CliError {
    /// A flag's value was missing, empty after trimming, or looked like
    /// another flag (spec §6: "Value forms for every flag must accept
    /// both `--flag value` and `--flag=value`").
    #[error("missing value for {flag}")]
    MissingValue {
        /// The flag that needed a value.
        flag: String,
    },

    /// An option was not recognized for the active subcommand.
    #[error("unknown option '{option}'")]
    UnknownOption {
        /// The raw token that wasn't recognized.
        option: String,
    },

    /// A run-only flag was used with `projects` (spec §6: "`projects`
    /// rejects run-only flags … with a specific diagnostic").
    #[error("'{flag}' is not supported by 'projects'; it only applies to 'run'")]
    RunOnlyFlag {
        /// The offending flag.
        flag: String,
    },

    /// `--ai-prompt`/`--autofix` combined with `--dry-run`.
    #[error("'{flag}' is incompatible with --dry-run")]
    IncompatibleFlags {
        /// The offending flag.
        flag: String,
    },

    /// The first positional token wasn't `projects` or `run`.
    #[error("unknown command '{command}'; expected 'projects' or 'run'")]
    UnknownCommand {
        /// The offending token.
        command: String,
    },

    /// `projects <x>` where `<x>` isn't `list` or `graph`.
    #[error("unknown 'projects' subcommand '{subcommand}'; expected 'list' or 'graph'")]
    UnknownProjectsSubcommand {
        /// The offending token.
        subcommand: String,
    },

    /// `run` was given no task name.
    #[error("'run' requires a task name")]
    MissingTask,

    /// `projects` was given extra positional arguments after its mode.
    #[error("unexpected argument '{argument}'")]
    UnexpectedArgument {
        /// The offending token.
        argument: String,
    },

    /// A numeric flag value (`--parallel`, `--concurrency`) failed to parse.
    #[error("invalid value for {flag}: {reason}")]
    InvalidFlagValue {
        /// The flag name.
        flag: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An error from the workspace runner itself.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// JSON serialization of a dry-run report failed.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CliError {
    /// Maps this error to a process exit code. Every CLI-level parsing
    /// failure and every runner error share exit code 1 (spec §6:
    /// "Exit codes: 0 on success; 1 on any configuration error,
    /// unsupported file, cycle, empty project selection, failed child,
    /// or invalid environment variable").
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        1
    }
}
