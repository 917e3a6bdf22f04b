//! The top-level pipeline facade: discover projects, resolve
//! dependencies, build the graph, then filter/close/plan/execute. Wires
//! together C2 through C8 (spec §2's data-flow diagram) behind one
//! entrypoint so `wiggum_cli` doesn't need to know the component order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, RunnerError};
use crate::filter::{self, ProjectFilters};
use crate::graph::{self, Graph};
use crate::project::Project;
use crate::resolver::{self, ResolverOptions};
use crate::{config, env};

/// Knobs for [`Workspace::discover`].
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// An explicit runner config path (`--config`), overriding
    /// autodetection.
    pub explicit_config_path: Option<PathBuf>,
    /// Dependency-resolution knobs (§4.5).
    pub resolver: ResolverOptions,
}

/// A fully discovered and resolved workspace: every project, and the
/// graph derived from them. Built once per invocation; never mutated
/// (spec §3's "Lifecycles").
#[derive(Debug, Clone)]
pub struct Workspace {
    /// The workspace root that was scanned.
    pub root_dir: PathBuf,
    /// The runner config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
    /// Every discovered project, sorted by `(name, root)`.
    pub projects: Vec<Project>,
    /// The graph derived from `projects`.
    pub graph: Graph,
}

impl Workspace {
    /// Runs the full discover → collect → resolve → build pipeline.
    pub fn discover(root_dir: &Path, options: &DiscoverOptions) -> Result<Self> {
        let (config_path, mut projects) =
            config::load_and_collect(root_dir, options.explicit_config_path.as_deref())?;

        log::debug!(
            "loaded runner config: {}",
            config_path
                .as_ref()
                .map_or_else(|| "<none>".to_string(), |p| p.display().to_string())
        );

        resolver::resolve_dependencies(&mut projects, &options.resolver);
        let graph = graph::build_graph(&projects);

        Ok(Self {
            root_dir: root_dir.to_path_buf(),
            config_path,
            projects,
            graph,
        })
    }

    /// Fails with [`RunnerError::CycleDetected`] if the graph has any
    /// cycle. `run` flows must call this before planning; `projects`
    /// flows surface the cycle list instead of failing (spec: `projects`
    /// never executes anything, so a cycle is informational there).
    pub fn ensure_acyclic(&self) -> Result<()> {
        if self.graph.is_acyclic() {
            Ok(())
        } else {
            Err(RunnerError::CycleDetected {
                cycles: self.graph.cycles.clone(),
            })
        }
    }

    /// Applies `filters` to the full project set, optionally closing over
    /// transitive dependencies (`run` flows only, per spec §4.7). Fails
    /// with [`RunnerError::NoProjectsSelected`] if nothing survives.
    pub fn select(&self, filters: &ProjectFilters, close_dependencies: bool) -> Result<BTreeSet<String>> {
        let selected: BTreeSet<String> = filters
            .select(&self.projects)
            .into_iter()
            .map(|project| project.name.clone())
            .collect();

        if selected.is_empty() {
            return Err(RunnerError::NoProjectsSelected);
        }

        let scope = if close_dependencies {
            filter::close_over_dependencies(&self.projects, &selected)
        } else {
            selected
        };

        Ok(scope)
    }

    /// Materializes the projects in `scope`, with each project's
    /// dependency sets restricted to other members of `scope` (spec
    /// §4.7: "restricted to projects still in scope").
    #[must_use]
    pub fn scoped_projects(&self, scope: &BTreeSet<String>) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|project| scope.contains(&project.name))
            .cloned()
            .collect();
        filter::restrict_to_scope(&mut projects, scope);
        projects
    }
}

/// Resolves the effective worker-pool size: an explicit `--parallel`/
/// `--concurrency` flag wins, otherwise `WIGGUM_RUNNER_PARALLEL` if
/// valid, otherwise the default of 4 (spec §4.8). `env_value` is `None`
/// when the variable is unset.
pub fn resolve_parallel(explicit: Option<usize>, env_value: Option<&str>) -> Result<usize> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    match env_value {
        Some(raw) => env::parse_parallel(raw),
        None => Ok(4),
    }
}

/// Resolves the effective inferred-import scan cap the same way
/// [`resolve_parallel`] resolves concurrency (spec §4.5, default 400).
pub fn resolve_max_files_per_project(explicit: Option<usize>, env_value: Option<&str>) -> Result<usize> {
    if let Some(value) = explicit {
        return Ok(value);
    }
    match env_value {
        Some(raw) => Ok(env::parse_max_files(raw)?.unwrap_or(400)),
        None => Ok(400),
    }
}
