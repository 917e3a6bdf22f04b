//! Human-readable and JSON rendering of runner output (spec §6's dry-run
//! schema, §4.8's failure summary). Data output (project listings, the
//! dry-run plan, `--json`) goes to stdout; diagnostics (the failure
//! summary, the remediation prompt) go to stderr, keeping the two
//! independently parseable per SPEC_FULL §10.

use wiggum_runner::executor::ExecutionSummary;
use wiggum_runner::graph::Graph;
use wiggum_runner::report::{DryRunReport, ProjectSummary};

use crate::error::Result;

/// Serializes `report` as pretty JSON to stdout.
#[allow(clippy::print_stdout)]
pub fn print_json(report: &DryRunReport) -> Result<()> {
    let text = serde_json::to_string_pretty(report)?;
    println!("{text}");
    Ok(())
}

/// Prints one line per project: `name` then its display root.
#[allow(clippy::print_stdout)]
pub fn print_project_list(summaries: &[ProjectSummary]) {
    for summary in summaries {
        println!("{}\t{}", summary.name, summary.root.display());
    }
}

/// Prints the graph's levels and edges as plain text.
#[allow(clippy::print_stdout)]
pub fn print_graph(graph: &Graph) {
    println!("levels:");
    for (index, level) in graph.levels.iter().enumerate() {
        println!("  {index}: {}", level.join(", "));
    }
    println!("edges:");
    for edge in &graph.edges {
        println!("  {} -> {} ({:?})", edge.from, edge.to, edge.reason);
    }
    if graph.cycles.is_empty() {
        println!("cycles: none");
    } else {
        for cycle in &graph.cycles {
            println!("cycle: {}", cycle.join(" -> "));
        }
    }
}

/// Prints the computed dry-run plan as plain text, one line per entry in
/// execution order.
#[allow(clippy::print_stdout)]
pub fn print_plan(report: &DryRunReport) {
    if let Some(task) = &report.task {
        println!("task: {task}");
    }
    println!("root: {}", report.root_dir.display());
    for entry in report.plan.iter().flatten() {
        let args = entry.args.join(" ");
        println!("{} -> {} {} ({})", entry.project, entry.tool, args, entry.cwd.display());
    }
}

/// Prints the failure summary (spec §4.8, scenario 6) to stderr, in the
/// order `ExecutionSummary` already guarantees (execution/topological
/// order).
pub fn print_failure_summary(summary: &ExecutionSummary) {
    eprintln!("failures:");
    for failure in &summary.failures {
        eprintln!("  {} :: `{}` exited {}", failure.project, failure.command, failure.code);
        if let Some(stdout) = &failure.stdout {
            if !stdout.is_empty() {
                eprintln!("    stdout: {}", stdout.trim_end());
            }
        }
        if let Some(stderr) = &failure.stderr {
            if !stderr.is_empty() {
                eprintln!("    stderr: {}", stderr.trim_end());
            }
        }
    }
    if !summary.skipped.is_empty() {
        eprintln!("skipped: {}", summary.skipped.join(", "));
    }
}

/// Prints a remediation prompt suitable for pasting into an AI assistant
/// (spec §6's `--ai-prompt`; `--autofix` always falls back to this since
/// launching an interactive assistant is explicitly out of scope, spec
/// §1).
pub fn print_remediation_prompt(summary: &ExecutionSummary) {
    eprintln!("--- remediation prompt ---");
    eprintln!("The following project tasks failed. Diagnose and propose a fix for each:");
    for failure in &summary.failures {
        eprintln!();
        eprintln!("project: {}", failure.project);
        eprintln!("command: {}", failure.command);
        eprintln!("exit code: {}", failure.code);
        if let Some(stdout) = &failure.stdout {
            eprintln!("stdout:\n{stdout}");
        }
        if let Some(stderr) = &failure.stderr {
            eprintln!("stderr:\n{stderr}");
        }
    }
    eprintln!("--- end remediation prompt ---");
}
