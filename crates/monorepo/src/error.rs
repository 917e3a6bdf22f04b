//! Error kinds for the Workspace Runner (spec §7). Every error carries the
//! context that triggered it (project name, config path, flag name) and
//! maps to exactly one of the exit codes from §6.

use std::path::PathBuf;

use thiserror::Error;
use wiggum_standard_tools::error::CommandError;

/// All errors the runner's components can raise.
#[derive(Debug, Error, Clone)]
pub enum RunnerError {
    /// Autodetection found no recognized config file under `root`.
    #[error("no runner config file found under {root}; expected one of wiggum.config.mjs, wiggum.config.js, wiggum.config.cjs, wiggum.config.json")]
    ConfigNotFound {
        /// The workspace root that was searched.
        root: PathBuf,
    },

    /// The resolved config path isn't one this build can evaluate: either a
    /// `.ts`/`.mts`/`.cts` source-typed name, or a recognized `.mjs`/`.js`/
    /// `.cjs` script name with the `script-config` feature disabled.
    #[error("unsupported runner config variant at {path}; wiggum.config.json is the only built-in variant (enable the script-config feature for wiggum.config.{{mjs,js,cjs}})")]
    UnsupportedConfigVariant {
        /// The offending config path.
        path: PathBuf,
    },

    /// The config file failed to parse, or had an unrecognized shape.
    #[error("invalid runner config at {path}: {reason}")]
    InvalidConfig {
        /// The config file that failed to parse.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// A non-glob string config entry points to a path that doesn't exist.
    #[error("project entry {entry} does not exist (resolved under {scope_root})")]
    MissingProjectEntry {
        /// The raw entry string from the config.
        entry: String,
        /// The scope root it was resolved against.
        scope_root: PathBuf,
    },

    /// A resolved path is neither a directory, a manifest, nor a recognized
    /// tool config file.
    #[error("unsupported project file {path} in {scope_root}")]
    UnsupportedProjectFile {
        /// The offending path.
        path: PathBuf,
        /// The scope it was discovered under.
        scope_root: PathBuf,
    },

    /// Two distinct roots both claim the same project name.
    #[error("duplicate project name '{name}': already registered at {existing_root}, also found at {new_root}")]
    DuplicateProjectName {
        /// The colliding name.
        name: String,
        /// The root that first claimed the name.
        existing_root: PathBuf,
        /// The root that collided with it.
        new_root: PathBuf,
    },

    /// Two distinct projects declare the same non-empty manifest `name`.
    #[error("duplicate package name '{package_name}': declared by both {first_root} and {second_root}")]
    DuplicatePackageName {
        /// The colliding manifest name.
        package_name: String,
        /// The first project that declared it.
        first_root: PathBuf,
        /// The second project that declared it.
        second_root: PathBuf,
    },

    /// The dependency graph has at least one strongly-connected component
    /// of size ≥ 2, or a self-loop.
    #[error("Circular project dependencies detected: {}", format_cycles(.cycles))]
    CycleDetected {
        /// Each cycle, lexicographically sorted, in first-element order.
        cycles: Vec<Vec<String>>,
    },

    /// Filters (or the config itself) reduced the selection to nothing.
    #[error("no projects selected")]
    NoProjectsSelected,

    /// A flag's value failed to parse (numeric, path, or pattern).
    #[error("invalid value for {flag}: {reason}")]
    InvalidFlag {
        /// The flag name, e.g. `--parallel`.
        flag: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An environment variable override failed to parse.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar {
        /// The environment variable name.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// One or more task subprocesses exited non-zero.
    #[error("`{command}` failed for project '{project}' with exit code {code}")]
    ChildFailed {
        /// The project whose task failed.
        project: String,
        /// The resolved command line, for diagnostics.
        command: String,
        /// The process exit code.
        code: i32,
    },

    /// Subprocess spawn/wait failure, not a task failure.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Underlying filesystem/glob error.
    #[error("path error: {0}")]
    Path(#[from] wiggum_standard_tools::error::PathError),
}

fn format_cycles(cycles: &[Vec<String>]) -> String {
    cycles
        .iter()
        .map(|cycle| cycle.join(" -> "))
        .collect::<Vec<_>>()
        .join(", ")
}

impl RunnerError {
    /// A stable, machine-readable kind tag (mirrors §7's error kind names).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RunnerError::ConfigNotFound { .. } => "ConfigNotFound",
            RunnerError::UnsupportedConfigVariant { .. } => "UnsupportedConfigVariant",
            RunnerError::InvalidConfig { .. } => "InvalidConfig",
            RunnerError::MissingProjectEntry { .. } => "MissingProjectEntry",
            RunnerError::UnsupportedProjectFile { .. } => "UnsupportedProjectFile",
            RunnerError::DuplicateProjectName { .. } => "DuplicateProjectName",
            RunnerError::DuplicatePackageName { .. } => "DuplicatePackageName",
            RunnerError::CycleDetected { .. } => "CycleDetected",
            RunnerError::NoProjectsSelected => "NoProjectsSelected",
            RunnerError::InvalidFlag { .. } => "InvalidFlag",
            RunnerError::InvalidEnvVar { .. } => "InvalidEnvVar",
            RunnerError::ChildFailed { .. } => "ChildFailed",
            RunnerError::Command(_) => "Command",
            RunnerError::Path(_) => "Path",
        }
    }
}

impl AsRef<str> for RunnerError {
    fn as_ref(&self) -> &str {
        self.kind()
    }
}

/// Result type used throughout the runner.
pub type Result<T> = core::result::Result<T, RunnerError>;
