//! Environment variable override parsing (spec §6/§12). Pure functions
//! only — the CLI reads `std::env::var` once and threads the parsed
//! value in explicitly, rather than this crate reaching into the
//! environment itself (spec §9: replace the "global mutable state" of a
//! process-wide cache with "an explicit config struct threaded into the
//! runner so tests can inject fixtures").

use crate::error::{Result, RunnerError};

/// Name of the environment variable overriding the default worker-pool
/// size for `run`.
pub const PARALLEL_VAR: &str = "WIGGUM_RUNNER_PARALLEL";

/// Name of the environment variable overriding the default per-project
/// inferred-import scan cap.
pub const INFER_IMPORT_MAX_FILES_VAR: &str = "WIGGUM_RUNNER_INFER_IMPORT_MAX_FILES";

/// Parses `WIGGUM_RUNNER_PARALLEL`'s raw value into a worker-pool size.
/// Must be a positive integer; any other value is an error the caller
/// decides whether to surface (ignored for `projects`, fatal for `run`).
pub fn parse_parallel(raw: &str) -> Result<usize> {
    parse_positive_integer(raw, PARALLEL_VAR)
}

/// Parses `WIGGUM_RUNNER_INFER_IMPORT_MAX_FILES`'s raw value. Whitespace-
/// only values are treated as unset (`Ok(None)`); anything else must
/// parse as a positive integer.
pub fn parse_max_files(raw: &str) -> Result<Option<usize>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_positive_integer(raw, INFER_IMPORT_MAX_FILES_VAR).map(Some)
}

fn parse_positive_integer(raw: &str, var: &str) -> Result<usize> {
    let trimmed = raw.trim();
    let value: i64 = trimmed.parse().map_err(|_| RunnerError::InvalidEnvVar {
        var: var.to_string(),
        reason: format!("expected a positive integer, got '{raw}'"),
    })?;
    if value <= 0 {
        return Err(RunnerError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a positive integer, got '{raw}'"),
        });
    }
    usize::try_from(value).map_err(|_| RunnerError::InvalidEnvVar {
        var: var.to_string(),
        reason: format!("value '{raw}' is out of range"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_parallel() {
        assert_eq!(parse_parallel("4").expect("parse"), 4);
    }

    #[test]
    fn rejects_zero_and_negative_parallel() {
        assert!(parse_parallel("0").is_err());
        assert!(parse_parallel("-1").is_err());
    }

    #[test]
    fn rejects_non_numeric_parallel() {
        assert!(parse_parallel("abc").is_err());
    }

    #[test]
    fn whitespace_only_max_files_is_treated_as_unset() {
        assert_eq!(parse_max_files("   ").expect("parse"), None);
    }

    #[test]
    fn invalid_max_files_is_an_error() {
        assert!(parse_max_files("-5").is_err());
        assert!(parse_max_files("1.5").is_err());
    }

    #[test]
    fn valid_max_files_parses() {
        assert_eq!(parse_max_files("250").expect("parse"), Some(250));
    }
}
