//! Dispatch: wires a parsed [`crate::args::Command`] into
//! `wiggum_runner`'s discover → resolve → plan → execute pipeline (spec
//! §2's data-flow diagram, §6's CLI surface).

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use wiggum_runner::executor::{execute_levels, ExecutionOptions, OutputMode};
use wiggum_runner::filter::ProjectFilters;
use wiggum_runner::plan::{build_plan, group_by_level};
use wiggum_runner::report::{summarize_project, DryRunReport};
use wiggum_runner::resolver::ResolverOptions;
use wiggum_runner::workspace::{resolve_max_files_per_project, resolve_parallel, DiscoverOptions, Workspace};
use wiggum_standard_tools::command::{DefaultCommandExecutor, Executor};

use crate::args::{Command, HelpTopic, ParsedArgs, ProjectsMode, RunnerOptions};
use crate::env_overrides::EnvOverrides;
use crate::error::Result;
use crate::output;
use crate::tasks;

/// Runs the parsed invocation to completion, returning the process exit
/// code (spec §6's exit-code table).
pub async fn dispatch(parsed: ParsedArgs, env: &EnvOverrides) -> Result<i32> {
    match parsed.command {
        Command::Help(topic) => {
            print_help(topic);
            Ok(0)
        }
        Command::Projects { mode } => run_projects(mode, &parsed.options, env).await,
        Command::Run { task, extra_args } => run_task(&task, &extra_args, &parsed.options, env).await,
    }
}

#[allow(clippy::print_stdout)]
fn print_help(topic: HelpTopic) {
    println!("{}", crate::args::help_text(topic));
}

fn root_dir(options: &RunnerOptions) -> PathBuf {
    match &options.root {
        Some(raw) => PathBuf::from(raw),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Resolves inference knobs the same way for both subcommands (spec §6:
/// the import-scan cap env var applies "when import inference is
/// active", so an invalid value is ignored outright once
/// `--no-infer-imports` turns inference off).
fn resolver_options(options: &RunnerOptions, env: &EnvOverrides) -> Result<ResolverOptions> {
    let include_inferred_imports = !options.no_infer_imports;
    let max_files_per_project = if include_inferred_imports {
        resolve_max_files_per_project(None, env.infer_import_max_files.as_deref())?
    } else if env.infer_import_max_files.is_some() {
        log::warn!(
            "WIGGUM_RUNNER_INFER_IMPORT_MAX_FILES is set but ignored: import inference is disabled (--no-infer-imports)"
        );
        ResolverOptions::default().max_files_per_project
    } else {
        ResolverOptions::default().max_files_per_project
    };
    Ok(ResolverOptions {
        include_inferred_imports,
        max_files_per_project,
    })
}

async fn run_projects(mode: ProjectsMode, options: &RunnerOptions, env: &EnvOverrides) -> Result<i32> {
    if env.parallel.is_some() {
        log::warn!("WIGGUM_RUNNER_PARALLEL is set but ignored: 'projects' doesn't execute tasks");
    }
    let root = root_dir(options);
    let discover_options = DiscoverOptions {
        explicit_config_path: options.config.as_ref().map(PathBuf::from),
        resolver: resolver_options(options, env)?,
    };
    let workspace = Workspace::discover(&root, &discover_options)?;

    let filters = ProjectFilters::parse(&options.project_patterns)?;
    let scope = workspace.select(&filters, false)?;
    let scoped = workspace.scoped_projects(&scope);
    let summaries: Vec<_> = scoped.iter().map(|p| summarize_project(p, &workspace.root_dir)).collect();

    let graph = matches!(mode, ProjectsMode::Graph).then(|| workspace.graph.clone());

    if options.json {
        let report = DryRunReport {
            task: None,
            root_dir: workspace.root_dir.clone(),
            config_path: workspace.config_path.clone(),
            graph,
            projects: summaries,
            plan: None,
        };
        output::print_json(&report)?;
    } else {
        match mode {
            ProjectsMode::List => output::print_project_list(&summaries),
            ProjectsMode::Graph => output::print_graph(&workspace.graph),
        }
    }

    Ok(0)
}

async fn run_task(task: &str, extra_args: &[String], options: &RunnerOptions, env: &EnvOverrides) -> Result<i32> {
    let root = root_dir(options);
    let discover_options = DiscoverOptions {
        explicit_config_path: options.config.as_ref().map(PathBuf::from),
        resolver: resolver_options(options, env)?,
    };
    let workspace = Workspace::discover(&root, &discover_options)?;
    workspace.ensure_acyclic()?;

    let filters = ProjectFilters::parse(&options.project_patterns)?;
    let scope = workspace.select(&filters, true)?;
    let scoped = workspace.scoped_projects(&scope);

    let resolver = tasks::default_resolver();
    let plan = build_plan(&scoped, &workspace.graph, &scope, &resolver, task, extra_args)?;

    if options.dry_run {
        let summaries: Vec<_> = scoped.iter().map(|p| summarize_project(p, &workspace.root_dir)).collect();
        let report = DryRunReport {
            task: Some(task.to_string()),
            root_dir: workspace.root_dir.clone(),
            config_path: workspace.config_path.clone(),
            graph: Some(workspace.graph.clone()),
            projects: summaries,
            plan: Some(plan),
        };
        if options.json {
            output::print_json(&report)?;
        } else {
            output::print_plan(&report);
        }
        return Ok(0);
    }

    let parallel = resolve_parallel(options.parallel, env.parallel.as_deref())?;
    let levels = group_by_level(&plan, &workspace.graph, &scope);
    let output_mode = if options.ai_prompt || options.autofix {
        OutputMode::Capture
    } else {
        OutputMode::Stream
    };
    let execution_options = ExecutionOptions { parallel, output_mode };

    let cancelled = Arc::new(AtomicBool::new(false));
    let signal_cancelled = Arc::clone(&cancelled);
    // Spec §5: "Signal INT forwards to all running children, then the
    // process exits non-zero." We stop dispatching further work the
    // moment it fires; already-spawned children are awaited to
    // completion rather than killed outright, since `Executor` has no
    // handle to signal a specific child once spawned.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancelled.store(true, Ordering::SeqCst);
        }
    });

    let executor: Arc<dyn Executor + Send + Sync> = Arc::new(DefaultCommandExecutor::new());
    let summary = execute_levels(&levels, executor, execution_options, task, &cancelled).await;

    if summary.has_failures() {
        output::print_failure_summary(&summary);
        if options.ai_prompt || options.autofix {
            output::print_remediation_prompt(&summary);
        }
        Ok(1)
    } else if summary.is_unsuccessful() {
        eprintln!("error: {task} interrupted (Ctrl-C)");
        Ok(1)
    } else {
        info!("[runner] {task} completed: {} project(s) succeeded", summary.succeeded.len());
        Ok(0)
    }
}
