//! One-shot environment capture (SPEC_FULL §12). `main` reads
//! `std::env::var` exactly once, here, and threads the raw values down
//! explicitly — `wiggum_runner` never touches `std::env` itself, which is
//! what lets its tests inject fixture values instead (spec §9: "Replace
//! with an explicit config struct threaded into the runner so tests can
//! inject fixtures").

use wiggum_runner::env::{INFER_IMPORT_MAX_FILES_VAR, PARALLEL_VAR};

/// Raw (unparsed) environment variable values captured at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    /// `WIGGUM_RUNNER_PARALLEL`, if set.
    pub parallel: Option<String>,
    /// `WIGGUM_RUNNER_INFER_IMPORT_MAX_FILES`, if set.
    pub infer_import_max_files: Option<String>,
}

impl EnvOverrides {
    /// Reads both variables once via `std::env::var`.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            parallel: std::env::var(PARALLEL_VAR).ok(),
            infer_import_max_files: std::env::var(INFER_IMPORT_MAX_FILES_VAR).ok(),
        }
    }
}
