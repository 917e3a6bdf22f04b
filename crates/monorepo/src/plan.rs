//! Plan building (C8, planning half): resolves a task name to a concrete
//! tool invocation per project and produces the ordered `ExecutionPlan`
//! (spec §3 "ExecutionPlan entry", §4.8).
//!
//! Locating and invoking the underlying build tool is explicitly out of
//! scope for the runner (spec §1): this module only needs a
//! [`TaskResolver`] that says *which* command a task name maps to. The
//! hosting CLI supplies the real one; [`TaskResolver`] is the seam.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Result, RunnerError};
use crate::graph::Graph;
use crate::project::Project;

/// The concrete program + fixed leading arguments a task name resolves
/// to, e.g. task `"build"` → `npm run build`.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// The program to invoke (resolved on `PATH` by the OS).
    pub program: String,
    /// Arguments preceding the project's own `args`.
    pub base_args: Vec<String>,
}

impl ToolInvocation {
    /// Builds a new tool invocation.
    #[must_use]
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }
}

/// Maps a task name to the tool that runs it, and names the closed set of
/// supported tasks for the "unknown task" diagnostic (spec §6).
pub trait TaskResolver: Send + Sync {
    /// Resolves `task` to a concrete tool invocation, or
    /// [`RunnerError::InvalidFlag`] if it isn't in [`Self::supported_tasks`].
    fn resolve(&self, task: &str) -> Result<ToolInvocation>;

    /// The closed set of task names this resolver supports, for the
    /// "unsupported task" diagnostic.
    fn supported_tasks(&self) -> &[&str];
}

/// One per-project entry in the computed execution plan, in topological
/// order (spec §3).
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlanEntry {
    /// The project this entry runs the task for.
    pub project: String,
    /// The directory the task runs in (the project's root).
    pub cwd: PathBuf,
    /// The resolved program name.
    pub tool: String,
    /// `project.args` followed by passthrough args after `--`.
    pub args: Vec<String>,
}

/// Builds the per-project execution plan for `task`, in the graph's
/// topological order restricted to `scope`. `passthrough_args` are CLI
/// tokens after `--`, appended to every project's own `args` verbatim.
pub fn build_plan(
    projects: &[Project],
    graph: &Graph,
    scope: &std::collections::BTreeSet<String>,
    resolver: &dyn TaskResolver,
    task: &str,
    passthrough_args: &[String],
) -> Result<Vec<ExecutionPlanEntry>> {
    let invocation = resolver.resolve(task)?;
    let by_name: std::collections::HashMap<&str, &Project> =
        projects.iter().map(|p| (p.name.as_str(), p)).collect();

    let mut plan = Vec::with_capacity(scope.len());
    for name in &graph.topological_order {
        if !scope.contains(name) {
            continue;
        }
        let Some(project) = by_name.get(name.as_str()) else {
            continue;
        };
        let mut args = invocation.base_args.clone();
        args.extend(project.args.iter().cloned());
        args.extend(passthrough_args.iter().cloned());
        plan.push(ExecutionPlanEntry {
            project: project.name.clone(),
            cwd: project.root.clone(),
            tool: invocation.program.clone(),
            args,
        });
    }
    Ok(plan)
}

/// Groups a flat, topologically-ordered plan into the graph's levels, for
/// level-by-level bounded-concurrency execution (spec §4.8/§5).
#[must_use]
pub fn group_by_level(
    plan: &[ExecutionPlanEntry],
    graph: &Graph,
    scope: &std::collections::BTreeSet<String>,
) -> Vec<Vec<ExecutionPlanEntry>> {
    let by_name: std::collections::HashMap<&str, &ExecutionPlanEntry> =
        plan.iter().map(|entry| (entry.project.as_str(), entry)).collect();

    graph
        .levels
        .iter()
        .map(|level| {
            level
                .iter()
                .filter(|name| scope.contains(*name))
                .filter_map(|name| by_name.get(name.as_str()).map(|entry| (*entry).clone()))
                .collect::<Vec<_>>()
        })
        .filter(|level: &Vec<ExecutionPlanEntry>| !level.is_empty())
        .collect()
}

/// A task resolver closed over a fixed name → tool table, rejecting any
/// task not in the table with [`RunnerError::InvalidFlag`].
#[derive(Debug, Clone)]
pub struct TableTaskResolver {
    tasks: Vec<(&'static str, &'static str)>,
    supported: Vec<&'static str>,
}

impl TableTaskResolver {
    /// Builds a resolver from `(task, program)` pairs, e.g.
    /// `[("build", "npm"), ("test", "npm")]`, where each program receives
    /// `run <task>` as its base args.
    #[must_use]
    pub fn new(tasks: Vec<(&'static str, &'static str)>) -> Self {
        let supported = tasks.iter().map(|(task, _)| *task).collect();
        Self { tasks, supported }
    }
}

impl TaskResolver for TableTaskResolver {
    fn resolve(&self, task: &str) -> Result<ToolInvocation> {
        self.tasks
            .iter()
            .find(|(name, _)| *name == task)
            .map(|(name, program)| ToolInvocation::new(*program, vec!["run".to_string(), (*name).to_string()]))
            .ok_or_else(|| RunnerError::InvalidFlag {
                flag: "task".to_string(),
                reason: format!(
                    "unsupported task '{task}'; supported tasks are: {}",
                    self.supported.join(", ")
                ),
            })
    }

    fn supported_tasks(&self) -> &[&str] {
        &self.supported
    }
}
