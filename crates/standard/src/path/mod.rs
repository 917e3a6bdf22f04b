//! Path normalization, glob expansion, and JSON reading.
//!
//! Grounds §4.1 (C1) of the runner: every operation a config walk or
//! manifest read needs, with no knowledge of the workspace domain model.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSetBuilder};

use crate::error::PathError;

/// The token a glob pattern or config string may use in place of the
/// enclosing scope's base root. Substituted before expansion/resolution.
pub const ROOT_DIR_TOKEN: &str = "<rootDir>";

/// Returns an absolute, lexically resolved path.
///
/// Unlike [`Path::canonicalize`] this does not require the path to exist
/// and does not resolve symlinks; it only collapses `.`/`..` components
/// and anchors relative paths against `base` (or the current directory).
#[must_use]
pub fn normalize(path: &Path, base: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        use std::path::Component;
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Produces a display-only path relative to `root`, falling back to the
/// absolute path when no relative form exists (e.g. different drives).
#[must_use]
pub fn relativize(path: &Path, root: &Path) -> PathBuf {
    pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf())
}

/// Returns whether `path` exists on disk (file or directory).
#[must_use]
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Substitutes [`ROOT_DIR_TOKEN`] in a config string with `scope_root`.
#[must_use]
pub fn substitute_root_dir(raw: &str, scope_root: &Path) -> String {
    raw.replace(ROOT_DIR_TOKEN, &scope_root.to_string_lossy())
}

/// Reads a file and parses it as JSON.
pub fn read_json(path: &Path) -> Result<serde_json::Value, PathError> {
    let contents = fs::read_to_string(path).map_err(|error| PathError::ReadFailed {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|error| PathError::InvalidJson {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

/// Returns whether a pattern contains glob metacharacters.
#[must_use]
pub fn is_dynamic_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '{', '['])
}

/// Expands a glob pattern rooted at `cwd`, returning sorted, de-duplicated
/// absolute paths. `ignore` patterns are matched against paths relative to
/// `cwd` and exclude any match.
pub fn expand_glob(
    pattern: &str,
    cwd: &Path,
    ignore: &[String],
) -> Result<Vec<PathBuf>, PathError> {
    let mut ignore_builder = GlobSetBuilder::new();
    for raw in ignore {
        let glob = Glob::new(raw).map_err(|error| PathError::InvalidPattern {
            pattern: raw.clone(),
            reason: error.to_string(),
        })?;
        ignore_builder.add(glob);
    }
    let ignore_set = ignore_builder
        .build()
        .map_err(|error| PathError::InvalidPattern {
            pattern: ignore.join(","),
            reason: error.to_string(),
        })?;

    let full_pattern = cwd.join(pattern);
    let pattern_str = full_pattern.to_string_lossy().into_owned();

    let mut results = BTreeSet::new();
    let entries = glob::glob(&pattern_str).map_err(|error| PathError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: error.to_string(),
    })?;

    for entry in entries {
        let path = entry.map_err(|error| PathError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: error.to_string(),
        })?;
        let relative = relativize(&path, cwd);
        if ignore_set.is_match(&relative) {
            continue;
        }
        results.insert(path);
    }

    Ok(results.into_iter().collect())
}
