//! Dry-run JSON report (spec §4.8, §6 "Dry-run JSON schema (stable)").
//!
//! Field order is part of the stable contract: `task` (run only),
//! `rootDir`, `configPath`, `graph`, `projects`, `plan` (run only). Serde
//! preserves struct-field declaration order for JSON objects, so the
//! struct below is written in that exact order.

use std::path::PathBuf;

use serde::Serialize;

use crate::graph::Graph;
use crate::plan::ExecutionPlanEntry;
use crate::project::Project;

/// One project summary line in the dry-run report (spec §6).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    /// The project's unique name.
    pub name: String,
    /// Display (relative) root.
    pub root: PathBuf,
    /// Display (relative) tool-specific config path, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    /// Extra command arguments.
    pub args: Vec<String>,
    /// The manifest's declared package name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// In-workspace manifest dependencies.
    pub dependencies: Vec<String>,
    /// In-workspace inferred-import dependencies.
    pub inferred_dependencies: Vec<String>,
}

/// Builds a [`ProjectSummary`] with roots/config paths displayed relative
/// to `root_dir`.
#[must_use]
pub fn summarize_project(project: &Project, root_dir: &std::path::Path) -> ProjectSummary {
    ProjectSummary {
        name: project.name.clone(),
        root: wiggum_standard_tools::path::relativize(&project.root, root_dir),
        config: project
            .config_file
            .as_ref()
            .map(|p| wiggum_standard_tools::path::relativize(p, root_dir)),
        args: project.args.clone(),
        package_name: project.package_name.clone(),
        dependencies: project.dependencies.iter().cloned().collect(),
        inferred_dependencies: project.inferred_dependencies.iter().cloned().collect(),
    }
}

/// The stable dry-run JSON document (spec §6). Field declaration order is
/// the serialized key order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunReport {
    /// The task name, present only for `run` (absent for `projects`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// The workspace root that was scanned.
    pub root_dir: PathBuf,
    /// The runner config file that was loaded, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    /// The computed dependency graph, present for `projects graph` and
    /// every `run`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<Graph>,
    /// Summaries of every project in scope.
    pub projects: Vec<ProjectSummary>,
    /// The computed execution order, present only for `run`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<ExecutionPlanEntry>>,
}
