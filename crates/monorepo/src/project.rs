//! The `Project` data model (spec §3) and the final materialization step
//! of the Project collector (C4): sort, deduplicate, and enforce
//! `packageName` uniqueness across the whole workspace.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Result, RunnerError};

/// One buildable unit discovered by the config walk.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    /// Unique name across the workspace. Defaults to the manifest's
    /// package name, falling back to the directory base name; an
    /// explicit config name overrides both.
    pub name: String,
    /// Absolute, normalized, unique project root.
    pub root: PathBuf,
    /// Optional tool-specific config file (e.g. `rsbuild.config.ts`).
    pub config_file: Option<PathBuf>,
    /// Extra command arguments accumulated from every config scope that
    /// contained this project, outer scopes first, deduplicated
    /// preserving first occurrence.
    pub args: Vec<String>,
    /// The manifest's declared package name, if any.
    pub package_name: Option<String>,
    /// External dependency names discovered in the manifest, before
    /// mapping to in-workspace projects.
    pub dependency_package_names: BTreeSet<String>,
    /// In-workspace projects linked via the manifest.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    /// In-workspace projects linked only via source-import scanning.
    #[serde(default)]
    pub inferred_dependencies: BTreeSet<String>,
}

/// The accumulating record kept per root while the config tree is walked
/// (spec §4.2's "mutable collect context").
#[derive(Debug, Clone)]
pub(crate) struct MutableProject {
    pub name: String,
    pub root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub args: Vec<String>,
    pub package_name: Option<String>,
    pub dependency_package_names: BTreeSet<String>,
}

impl MutableProject {
    /// Appends `extra` args, preserving order and dropping duplicates —
    /// the merge rule applied when the same root is registered twice.
    pub(crate) fn merge_args(&mut self, extra: &[String]) {
        for arg in extra {
            if !self.args.contains(arg) {
                self.args.push(arg.clone());
            }
        }
    }
}

/// Sorts and finalizes the collected projects, enforcing `packageName`
/// uniqueness (spec §4.4: "Duplicate package names abort here, before
/// any resolution begins").
pub(crate) fn finalize_projects(
    by_root: BTreeMap<PathBuf, MutableProject>,
) -> Result<Vec<Project>> {
    let mut projects: Vec<Project> = by_root
        .into_values()
        .map(|mutable| Project {
            name: mutable.name,
            root: mutable.root,
            config_file: mutable.config_file,
            args: mutable.args,
            package_name: mutable.package_name,
            dependency_package_names: mutable.dependency_package_names,
            dependencies: BTreeSet::new(),
            inferred_dependencies: BTreeSet::new(),
        })
        .collect();

    projects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.root.cmp(&b.root)));

    let mut seen_package_names: HashMap<String, PathBuf> = HashMap::new();
    for project in &projects {
        let Some(package_name) = &project.package_name else {
            continue;
        };
        if package_name.is_empty() {
            continue;
        }
        if let Some(first_root) = seen_package_names.get(package_name) {
            return Err(RunnerError::DuplicatePackageName {
                package_name: package_name.clone(),
                first_root: first_root.clone(),
                second_root: project.root.clone(),
            });
        }
        seen_package_names.insert(package_name.clone(), project.root.clone());
    }

    Ok(projects)
}

/// Builds the `packageName → project name` map the resolver uses to turn
/// manifest dependency targets into in-workspace project names.
#[must_use]
pub fn package_name_index(projects: &[Project]) -> HashMap<String, String> {
    projects
        .iter()
        .filter_map(|project| {
            project
                .package_name
                .as_ref()
                .map(|package_name| (package_name.clone(), project.name.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mutable(name: &str, root: &str) -> MutableProject {
        MutableProject {
            name: name.to_string(),
            root: PathBuf::from(root),
            config_file: None,
            args: Vec::new(),
            package_name: Some(name.to_string()),
            dependency_package_names: BTreeSet::new(),
        }
    }

    #[test]
    fn finalize_sorts_by_name_then_root() {
        let mut by_root = BTreeMap::new();
        by_root.insert(PathBuf::from("/ws/b"), mutable("zeta", "/ws/b"));
        by_root.insert(PathBuf::from("/ws/a"), mutable("alpha", "/ws/a"));

        let projects = finalize_projects(by_root).expect("finalize");
        assert_eq!(projects[0].name, "alpha");
        assert_eq!(projects[1].name, "zeta");
    }

    #[test]
    fn finalize_rejects_duplicate_package_names() {
        let mut by_root = BTreeMap::new();
        let mut first = mutable("a", "/ws/a");
        first.package_name = Some("@s/shared".into());
        let mut second = mutable("b", "/ws/b");
        second.package_name = Some("@s/shared".into());
        by_root.insert(PathBuf::from("/ws/a"), first);
        by_root.insert(PathBuf::from("/ws/b"), second);

        let result = finalize_projects(by_root);
        assert!(matches!(result, Err(RunnerError::DuplicatePackageName { .. })));
    }

    #[test]
    fn merge_args_preserves_first_occurrence() {
        let mut project = mutable("a", "/ws/a");
        project.args = vec!["--flag".into()];
        project.merge_args(&["--flag".into(), "--other".into()]);
        assert_eq!(project.args, vec!["--flag".to_string(), "--other".to_string()]);
    }
}
