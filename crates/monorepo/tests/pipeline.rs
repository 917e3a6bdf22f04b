//! End-to-end pipeline tests driving [`Workspace::discover`] and the
//! plan/execute stages together against real temp-directory fixtures,
//! covering the scenarios from spec §8 that no single module's unit
//! tests exercise on their own.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::tempdir;

use wiggum_runner::executor::{execute_levels, ExecutionOptions, OutputMode};
use wiggum_runner::filter::ProjectFilters;
use wiggum_runner::plan::{build_plan, group_by_level, TableTaskResolver};
use wiggum_runner::resolver::ResolverOptions;
use wiggum_runner::workspace::{DiscoverOptions, Workspace};
use wiggum_runner::RunnerError;
use wiggum_standard_tools::command::DefaultCommandExecutor;

fn write_manifest(dir: &Path, name: &str, deps: &[(&str, &str)]) {
    let mut body = serde_json::Map::new();
    body.insert("name".into(), serde_json::Value::String(name.to_string()));
    let mut deps_map = serde_json::Map::new();
    for (k, v) in deps {
        deps_map.insert((*k).to_string(), serde_json::Value::String((*v).to_string()));
    }
    body.insert("dependencies".into(), serde_json::Value::Object(deps_map));
    fs::write(
        dir.join("package.json"),
        serde_json::to_string(&serde_json::Value::Object(body)).expect("serialize manifest"),
    )
    .expect("write manifest");
}

fn discover(root: &Path, options: ResolverOptions) -> Workspace {
    Workspace::discover(
        root,
        &DiscoverOptions {
            explicit_config_path: None,
            resolver: options,
        },
    )
    .expect("discover")
}

/// Scenario 1: a two-package chain plans in dependency order and groups
/// into two levels.
#[test]
fn simple_two_package_chain_plans_in_dependency_order() {
    let root = tempdir().expect("tempdir");
    let shared = root.path().join("packages/shared");
    let app = root.path().join("packages/app");
    fs::create_dir_all(&shared).expect("mkdir shared");
    fs::create_dir_all(&app).expect("mkdir app");
    write_manifest(&shared, "@s/shared", &[]);
    write_manifest(&app, "@s/app", &[("@s/shared", "workspace:*")]);
    fs::write(root.path().join("wiggum.config.json"), r#"{"projects": ["packages/*"]}"#)
        .expect("write config");

    let workspace = discover(root.path(), ResolverOptions::default());
    workspace.ensure_acyclic().expect("acyclic");

    let filters = ProjectFilters::parse(&[]).expect("empty filters");
    let scope = workspace.select(&filters, true).expect("select");
    let scoped = workspace.scoped_projects(&scope);

    let resolver = TableTaskResolver::new(vec![("build", "npm")]);
    let plan = build_plan(&scoped, &workspace.graph, &scope, &resolver, "build", &[]).expect("plan");
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].project, "@s/shared");
    assert_eq!(plan[1].project, "@s/app");

    let levels = group_by_level(&plan, &workspace.graph, &scope);
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0][0].project, "@s/shared");
    assert_eq!(levels[1][0].project, "@s/app");
}

/// Scenario 2: a source-level import not declared in `package.json`
/// still produces a dependency edge, and `--no-infer-imports` (modeled
/// here by disabling inference in `ResolverOptions`) drops it.
#[test]
fn inferred_import_edge_toggles_with_resolver_option() {
    let root = tempdir().expect("tempdir");
    let shared = root.path().join("packages/shared");
    let app = root.path().join("packages/app");
    fs::create_dir_all(&shared).expect("mkdir shared");
    fs::create_dir_all(app.join("src")).expect("mkdir app/src");
    write_manifest(&shared, "@s/shared", &[]);
    write_manifest(&app, "@s/app", &[]);
    fs::write(
        app.join("src/index.ts"),
        "import { build } from '@s/shared';\n",
    )
    .expect("write source");
    fs::write(root.path().join("wiggum.config.json"), r#"{"projects": ["packages/*"]}"#)
        .expect("write config");

    let with_inference = discover(root.path(), ResolverOptions::default());
    let app_project = with_inference
        .projects
        .iter()
        .find(|p| p.name == "@s/app")
        .expect("app project");
    assert!(app_project.inferred_dependencies.contains("@s/shared"));
    assert_eq!(with_inference.graph.topological_order, vec!["@s/shared", "@s/app"]);

    let without_inference = discover(
        root.path(),
        ResolverOptions {
            include_inferred_imports: false,
            ..ResolverOptions::default()
        },
    );
    let app_project = without_inference
        .projects
        .iter()
        .find(|p| p.name == "@s/app")
        .expect("app project");
    assert!(app_project.inferred_dependencies.is_empty());
    assert!(without_inference.graph.edges.is_empty());
}

/// Scenario 3: a cycle surfaces the exact diagnostic wording spec §7
/// mandates, and `run` flows must fail before planning anything.
#[test]
fn cycle_detection_produces_expected_message() {
    let root = tempdir().expect("tempdir");
    let a = root.path().join("a");
    let b = root.path().join("b");
    fs::create_dir_all(&a).expect("mkdir a");
    fs::create_dir_all(&b).expect("mkdir b");
    write_manifest(&a, "@s/a", &[("@s/b", "workspace:*")]);
    write_manifest(&b, "@s/b", &[("@s/a", "workspace:*")]);
    fs::write(root.path().join("wiggum.config.json"), r#"{"projects": ["a", "b"]}"#)
        .expect("write config");

    let workspace = discover(root.path(), ResolverOptions::default());
    let error = workspace.ensure_acyclic().expect_err("cycle must fail");
    assert!(matches!(error, RunnerError::CycleDetected { .. }));
    assert!(error.to_string().starts_with("Circular project dependencies detected:"));
}

/// Scenario 4: an npm alias (`npm:<name>`) that happens to name a
/// package declared elsewhere in the workspace still resolves to a
/// local dependency edge, same as a direct `workspace:*` specifier.
#[test]
fn npm_alias_resolves_to_local_project() {
    let root = tempdir().expect("tempdir");
    let shared = root.path().join("packages/shared");
    let app = root.path().join("packages/app");
    fs::create_dir_all(&shared).expect("mkdir shared");
    fs::create_dir_all(&app).expect("mkdir app");
    write_manifest(&shared, "@s/shared", &[]);
    write_manifest(&app, "@s/app", &[("shared-alias", "npm:@s/shared@1.0.0")]);
    fs::write(root.path().join("wiggum.config.json"), r#"{"projects": ["packages/*"]}"#)
        .expect("write config");

    let workspace = discover(root.path(), ResolverOptions::default());
    let app_project = workspace
        .projects
        .iter()
        .find(|p| p.name == "@s/app")
        .expect("app project");
    assert!(app_project.dependencies.contains("@s/shared"));
    assert_eq!(workspace.graph.topological_order, vec!["@s/shared", "@s/app"]);
}

/// Scenario 5: a `.ts` runner config is recognized by name but rejected
/// outright, never silently ignored.
#[test]
fn unsupported_config_variant_fails_with_named_path() {
    let root = tempdir().expect("tempdir");
    let config_path = root.path().join("wiggum.config.ts");
    fs::write(&config_path, "export default {}").expect("write config");

    let result = Workspace::discover(root.path(), &DiscoverOptions::default());
    match result {
        Err(RunnerError::UnsupportedConfigVariant { path }) => assert_eq!(path, config_path),
        other => panic!("expected UnsupportedConfigVariant, got {other:?}"),
    }
}

/// Scenario 6: two same-level projects both fail; the summary lists
/// them in lexicographic order and skips everything in the next level.
#[tokio::test]
async fn failure_summary_lists_same_level_failures_lexicographically() {
    let root = tempdir().expect("tempdir");
    let b = root.path().join("b");
    let a = root.path().join("a");
    let downstream = root.path().join("downstream");
    fs::create_dir_all(&a).expect("mkdir a");
    fs::create_dir_all(&b).expect("mkdir b");
    fs::create_dir_all(&downstream).expect("mkdir downstream");
    write_manifest(&a, "a", &[]);
    write_manifest(&b, "b", &[]);
    write_manifest(&downstream, "downstream", &[("a", "workspace:*"), ("b", "workspace:*")]);
    fs::write(
        root.path().join("wiggum.config.json"),
        r#"{"projects": ["a", "b", "downstream"]}"#,
    )
    .expect("write config");

    let workspace = discover(root.path(), ResolverOptions::default());
    workspace.ensure_acyclic().expect("acyclic");

    let filters = ProjectFilters::parse(&[]).expect("empty filters");
    let scope = workspace.select(&filters, true).expect("select");
    let scoped = workspace.scoped_projects(&scope);

    let resolver = TableTaskResolver::new(vec![("build", "sh")]);
    let plan = build_plan(&scoped, &workspace.graph, &scope, &resolver, "build", &["-c".to_string(), "exit 1".to_string()])
        .expect("plan");
    let levels = group_by_level(&plan, &workspace.graph, &scope);

    let executor: Arc<dyn wiggum_standard_tools::command::Executor + Send + Sync> =
        Arc::new(DefaultCommandExecutor::new());
    let cancelled = Arc::new(AtomicBool::new(false));
    let summary = execute_levels(
        &levels,
        executor,
        ExecutionOptions { parallel: 4, output_mode: OutputMode::Capture },
        "build",
        &cancelled,
    )
    .await;

    assert!(summary.has_failures());
    let failed_names: Vec<&str> = summary.failures.iter().map(|f| f.project.as_str()).collect();
    assert_eq!(failed_names, vec!["a", "b"]);
    assert_eq!(summary.skipped, vec!["downstream".to_string()]);
}

/// A config whose `projects` entry selects nothing still reports
/// `NoProjectsSelected` after filtering by a pattern that matches no one.
#[test]
fn filter_matching_nothing_is_reported_explicitly() {
    let root = tempdir().expect("tempdir");
    let app = root.path().join("app");
    fs::create_dir_all(&app).expect("mkdir app");
    write_manifest(&app, "@s/app", &[]);
    fs::write(root.path().join("wiggum.config.json"), r#"{"projects": ["app"]}"#).expect("write config");

    let workspace = discover(root.path(), ResolverOptions::default());
    let filters = ProjectFilters::parse(&["@s/nope".to_string()]).expect("parse");
    let result = workspace.select(&filters, false);
    assert!(matches!(result, Err(RunnerError::NoProjectsSelected)));
}
