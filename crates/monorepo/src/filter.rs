//! Filters & closure (C7): wildcard project selection, and transitive
//! dependency closure for `run` flows. See spec §4.7.

use std::collections::BTreeSet;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{Result, RunnerError};
use crate::project::Project;

/// One parsed `--project`/`-p` pattern.
#[derive(Debug, Clone)]
struct FilterPattern {
    negate: bool,
    matcher: GlobMatcher,
}

/// An ordered set of wildcard patterns (spec §4.7). A leading `!` marks a
/// negative (exclude) pattern.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilters {
    patterns: Vec<FilterPattern>,
}

impl ProjectFilters {
    /// Parses `--project`/`-p` values (already split on commas by the
    /// caller) into a filter set. Fails with [`RunnerError::InvalidFlag`]
    /// if a pattern doesn't compile as a glob.
    pub fn parse(raw_patterns: &[String]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            let (negate, body) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            let glob = GlobBuilder::new(body)
                .case_insensitive(true)
                .literal_separator(false)
                .build()
                .map_err(|error| RunnerError::InvalidFlag {
                    flag: "--project".to_string(),
                    reason: format!("invalid pattern '{raw}': {error}"),
                })?;
            patterns.push(FilterPattern {
                negate,
                matcher: glob.compile_matcher(),
            });
        }
        Ok(Self { patterns })
    }

    /// Whether this filter set has no patterns at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn matches_project(&self, project: &Project) -> bool {
        let candidates = [
            project.name.clone(),
            project.root.to_string_lossy().into_owned(),
            project
                .config_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        ];

        let positives: Vec<&FilterPattern> = self.patterns.iter().filter(|p| !p.negate).collect();
        let negatives: Vec<&FilterPattern> = self.patterns.iter().filter(|p| p.negate).collect();

        let matches_any = |pattern: &FilterPattern| {
            candidates
                .iter()
                .any(|candidate| pattern.matcher.is_match(candidate))
        };

        let passes_positive = positives.is_empty() || positives.iter().any(|p| matches_any(p));
        let passes_negative = !negatives.iter().any(|p| matches_any(p));

        passes_positive && passes_negative
    }

    /// Applies this filter set to `projects`, returning the surviving
    /// names. An empty result is the caller's to reject (spec:
    /// "An empty filter result is fatal").
    #[must_use]
    pub fn select<'a>(&self, projects: &'a [Project]) -> Vec<&'a Project> {
        projects
            .iter()
            .filter(|project| self.matches_project(project))
            .collect()
    }
}

/// Transitively closes `selected` over every project's manifest and
/// inferred dependencies (spec §4.7, used by `run` flows). `projects`
/// must be the full, unfiltered set so dependency lookups always resolve.
#[must_use]
pub fn close_over_dependencies(
    projects: &[Project],
    selected: &BTreeSet<String>,
) -> BTreeSet<String> {
    let by_name: std::collections::HashMap<&str, &Project> =
        projects.iter().map(|p| (p.name.as_str(), p)).collect();

    let mut closure = selected.clone();
    let mut frontier: Vec<String> = selected.iter().cloned().collect();

    while let Some(name) = frontier.pop() {
        let Some(project) = by_name.get(name.as_str()) else {
            continue;
        };
        for dependency in project.dependencies.iter().chain(project.inferred_dependencies.iter()) {
            if closure.insert(dependency.clone()) {
                frontier.push(dependency.clone());
            }
        }
    }

    closure
}

/// Restricts every project's dependency sets to names still present in
/// `scope` — applied after filtering/closure so a project's reported
/// dependencies never reference something out of scope (spec §4.7:
/// "After scoping, each project's dependency sets are restricted to
/// projects still in scope").
pub fn restrict_to_scope(projects: &mut [Project], scope: &BTreeSet<String>) {
    for project in projects {
        project.dependencies.retain(|name| scope.contains(name));
        project.inferred_dependencies.retain(|name| scope.contains(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn project(name: &str, deps: &[&str]) -> Project {
        Project {
            name: name.to_string(),
            root: PathBuf::from(format!("/ws/{name}")),
            config_file: None,
            args: Vec::new(),
            package_name: Some(name.to_string()),
            dependency_package_names: std::collections::BTreeSet::new(),
            dependencies: deps.iter().map(|s| (*s).to_string()).collect(),
            inferred_dependencies: std::collections::BTreeSet::new(),
        }
    }

    #[test]
    fn positive_pattern_selects_matching_projects() {
        let projects = vec![project("@s/app", &[]), project("@s/shared", &[])];
        let filters = ProjectFilters::parse(&["@s/app".to_string()]).expect("parse");
        let selected = filters.select(&projects);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "@s/app");
    }

    #[test]
    fn negative_pattern_excludes() {
        let projects = vec![project("@s/app", &[]), project("@s/shared", &[])];
        let filters = ProjectFilters::parse(&["!@s/shared".to_string()]).expect("parse");
        let selected = filters.select(&projects);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "@s/app");
    }

    #[test]
    fn wildcard_matches_scoped_names() {
        let projects = vec![project("@s/app", &[]), project("@t/other", &[])];
        let filters = ProjectFilters::parse(&["@s/*".to_string()]).expect("parse");
        let selected = filters.select(&projects);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "@s/app");
    }

    #[test]
    fn closure_pulls_in_transitive_dependencies() {
        let projects = vec![
            project("app", &["mid"]),
            project("mid", &["shared"]),
            project("shared", &[]),
        ];
        let mut selected = BTreeSet::new();
        selected.insert("app".to_string());
        let closure = close_over_dependencies(&projects, &selected);
        assert_eq!(
            closure,
            ["app", "mid", "shared"].into_iter().map(str::to_string).collect()
        );
    }

    #[test]
    fn restrict_to_scope_drops_out_of_scope_dependencies() {
        let mut projects = vec![project("app", &["mid", "shared"])];
        let mut scope = BTreeSet::new();
        scope.insert("app".to_string());
        scope.insert("mid".to_string());
        restrict_to_scope(&mut projects, &scope);
        assert!(projects[0].dependencies.contains("mid"));
        assert!(!projects[0].dependencies.contains("shared"));
    }
}
