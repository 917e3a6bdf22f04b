//! Hand-rolled argument parsing for the `wiggum` binary (spec §6).
//!
//! The surface has a handful of rules a derive-macro parser doesn't
//! express cleanly: `--flag value` and `--flag=value` are both accepted
//! everywhere, a `--help` token that lands where a flag's value was
//! expected is *not* a help request (the missing-value error wins
//! instead), `projects` rejects a fixed list of run-only flags with its
//! own diagnostic, and `run`'s task name is drawn from a closed set the
//! runner itself owns. A single left-to-right walk over argv expresses
//! all of that directly.

use crate::error::{CliError, Result};

/// `projects`'s own subcommand (spec §6: defaults to `list`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectsMode {
    /// `projects list` (also the default with no subcommand token).
    List,
    /// `projects graph`.
    Graph,
}

/// Which help text to print, so `wiggum run build --help` and
/// `wiggum run --help` don't print the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    /// `wiggum --help` or no arguments at all.
    Root,
    /// `wiggum projects --help`.
    Projects,
    /// `wiggum projects list --help`.
    ProjectsList,
    /// `wiggum projects graph --help`.
    ProjectsGraph,
    /// `wiggum run --help`.
    Run,
    /// `wiggum run <task> --help`.
    RunTask,
}

/// The resolved top-level command.
#[derive(Debug, Clone)]
pub enum Command {
    /// `wiggum projects [list|graph]`.
    Projects {
        /// Which listing to produce.
        mode: ProjectsMode,
    },
    /// `wiggum run <task>`.
    Run {
        /// The requested task name, unchecked against the supported set
        /// (that check happens against a [`wiggum_runner::plan::TaskResolver`]
        /// once one is available).
        task: String,
        /// Positional tokens after the task name, plus everything after
        /// `--`, forwarded verbatim (spec §6).
        extra_args: Vec<String>,
    },
    /// A `--help` token was seen; print usage for `topic` and exit 0.
    Help(HelpTopic),
}

/// Runner options shared by both subcommands (spec §6's flag table).
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// `--root`.
    pub root: Option<String>,
    /// `--config`.
    pub config: Option<String>,
    /// Every `--project`/`-p` value, already comma-split.
    pub project_patterns: Vec<String>,
    /// `--parallel`/`--concurrency`.
    pub parallel: Option<usize>,
    /// `--dry-run`.
    pub dry_run: bool,
    /// `--json`.
    pub json: bool,
    /// `--no-infer-imports`.
    pub no_infer_imports: bool,
    /// `--ai-prompt`.
    pub ai_prompt: bool,
    /// `--autofix`.
    pub autofix: bool,
    /// `-v`/`--verbose`, counted per repetition (spec §10: steps the
    /// default log filter, absent→warn, one→info, two+→debug).
    pub verbosity: u8,
}

/// The fully parsed invocation.
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    /// The resolved command.
    pub command: Command,
    /// Runner options collected along the way (still present even for
    /// `Command::Help`, though unused).
    pub options: RunnerOptions,
}

/// Parses `argv` (program name already stripped).
pub fn parse(argv: &[String]) -> Result<ParsedArgs> {
    let mut options = RunnerOptions::default();
    let mut run_only_flags_seen: Vec<String> = Vec::new();
    let mut positionals: Vec<String> = Vec::new();
    let mut passthrough: Vec<String> = Vec::new();
    let mut i = 0usize;

    while i < argv.len() {
        let token = argv[i].clone();

        if token == "--" {
            passthrough.extend(argv[i + 1..].iter().cloned());
            break;
        }

        if token == "--help" {
            return Ok(ParsedArgs {
                command: Command::Help(help_topic(&positionals)),
                options,
            });
        }

        if token == "--root" || token.starts_with("--root=") {
            i += 1;
            options.root = Some(take_value("--root", &token, argv, &mut i)?);
            continue;
        }
        if token == "--config" || token.starts_with("--config=") {
            i += 1;
            options.config = Some(take_value("--config", &token, argv, &mut i)?);
            continue;
        }
        if token == "--project" || token.starts_with("--project=") || token == "-p" || token.starts_with("-p=") {
            let display = if token.starts_with("-p") { "-p" } else { "--project" };
            i += 1;
            let value = take_value(display, &token, argv, &mut i)?;
            options.project_patterns.extend(split_patterns(&value));
            continue;
        }
        if token == "--parallel" || token.starts_with("--parallel=") {
            i += 1;
            let raw = take_value("--parallel", &token, argv, &mut i)?;
            options.parallel = Some(parse_positive_integer("--parallel", &raw)?);
            run_only_flags_seen.push("--parallel".to_string());
            continue;
        }
        if token == "--concurrency" || token.starts_with("--concurrency=") {
            i += 1;
            let raw = take_value("--concurrency", &token, argv, &mut i)?;
            options.parallel = Some(parse_positive_integer("--concurrency", &raw)?);
            run_only_flags_seen.push("--concurrency".to_string());
            continue;
        }
        if token == "--dry-run" {
            options.dry_run = true;
            run_only_flags_seen.push("--dry-run".to_string());
            i += 1;
            continue;
        }
        if token == "--json" {
            options.json = true;
            i += 1;
            continue;
        }
        if token == "--no-infer-imports" {
            options.no_infer_imports = true;
            i += 1;
            continue;
        }
        if token == "--ai-prompt" {
            options.ai_prompt = true;
            run_only_flags_seen.push("--ai-prompt".to_string());
            i += 1;
            continue;
        }
        if token == "--autofix" {
            options.autofix = true;
            run_only_flags_seen.push("--autofix".to_string());
            i += 1;
            continue;
        }
        if token == "--verbose" || token == "-v" {
            options.verbosity = options.verbosity.saturating_add(1);
            i += 1;
            continue;
        }

        if token.starts_with('-') && token.len() > 1 {
            // Once `run <task>` has been seen, further flag-like tokens
            // are the task's own arguments, not ours, so they're forwarded
            // rather than rejected (spec §6: "positional tokens after the
            // chosen task and before `--` are forwarded as extra task
            // arguments" — this includes flag-shaped ones, since the
            // runner doesn't know the underlying tool's flag grammar).
            let task_already_chosen =
                positionals.first().map(String::as_str) == Some("run") && positionals.len() >= 2;
            if task_already_chosen {
                positionals.push(token);
                i += 1;
                continue;
            }
            return Err(CliError::UnknownOption { option: token });
        }

        positionals.push(token);
        i += 1;
    }

    let command = resolve_command(&positionals, passthrough)?;

    if matches!(command, Command::Projects { .. }) {
        if let Some(flag) = run_only_flags_seen.first() {
            return Err(CliError::RunOnlyFlag { flag: flag.clone() });
        }
    }
    if matches!(command, Command::Run { .. }) && options.dry_run && (options.ai_prompt || options.autofix) {
        let flag = if options.autofix { "--autofix" } else { "--ai-prompt" };
        return Err(CliError::IncompatibleFlags { flag: flag.to_string() });
    }

    Ok(ParsedArgs { command, options })
}

fn resolve_command(positionals: &[String], passthrough: Vec<String>) -> Result<Command> {
    let mut rest = positionals.iter();
    match rest.next().map(String::as_str) {
        Some("projects") => {
            let mode = match rest.next().map(String::as_str) {
                None => ProjectsMode::List,
                Some("list") => ProjectsMode::List,
                Some("graph") => ProjectsMode::Graph,
                Some(other) => {
                    return Err(CliError::UnknownProjectsSubcommand {
                        subcommand: other.to_string(),
                    })
                }
            };
            if let Some(extra) = rest.next() {
                return Err(CliError::UnexpectedArgument { argument: extra.clone() });
            }
            Ok(Command::Projects { mode })
        }
        Some("run") => {
            let task = rest.next().cloned().ok_or(CliError::MissingTask)?;
            let mut extra_args: Vec<String> = rest.cloned().collect();
            extra_args.extend(passthrough);
            Ok(Command::Run { task, extra_args })
        }
        Some(other) => Err(CliError::UnknownCommand {
            command: other.to_string(),
        }),
        None => Err(CliError::UnknownCommand {
            command: String::new(),
        }),
    }
}

fn help_topic(positionals: &[String]) -> HelpTopic {
    match (positionals.first().map(String::as_str), positionals.get(1).map(String::as_str)) {
        (None, _) => HelpTopic::Root,
        (Some("projects"), None) => HelpTopic::Projects,
        (Some("projects"), Some("list")) => HelpTopic::ProjectsList,
        (Some("projects"), Some("graph")) => HelpTopic::ProjectsGraph,
        (Some("projects"), Some(_)) => HelpTopic::Projects,
        (Some("run"), None) => HelpTopic::Run,
        (Some("run"), Some(_)) => HelpTopic::RunTask,
        (Some(_), _) => HelpTopic::Root,
    }
}

/// Reads a flag's value out of either `token` (the `--flag=value` form)
/// or the next element of `argv` (the `--flag value` form), advancing `i`
/// past it when consumed that way. A next token that's absent or itself
/// starts with `-` (including `--help`) fails as a missing value, per
/// spec §6 — this is also why `--help` used as a value is never treated
/// as a help request.
fn take_value(flag_display: &str, token: &str, argv: &[String], i: &mut usize) -> Result<String> {
    if let Some(eq_pos) = token.find('=') {
        let trimmed = token[eq_pos + 1..].trim();
        return if trimmed.is_empty() {
            Err(CliError::MissingValue {
                flag: flag_display.to_string(),
            })
        } else {
            Ok(trimmed.to_string())
        };
    }

    match argv.get(*i) {
        Some(value) if !value.starts_with('-') => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(CliError::MissingValue {
                    flag: flag_display.to_string(),
                });
            }
            *i += 1;
            Ok(trimmed.to_string())
        }
        _ => Err(CliError::MissingValue {
            flag: flag_display.to_string(),
        }),
    }
}

fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn parse_positive_integer(flag: &str, raw: &str) -> Result<usize> {
    let value: i64 = raw.parse().map_err(|_| CliError::InvalidFlagValue {
        flag: flag.to_string(),
        reason: format!("expected a positive integer, got '{raw}'"),
    })?;
    if value <= 0 {
        return Err(CliError::InvalidFlagValue {
            flag: flag.to_string(),
            reason: format!("expected a positive integer, got '{raw}'"),
        });
    }
    usize::try_from(value).map_err(|_| CliError::InvalidFlagValue {
        flag: flag.to_string(),
        reason: format!("value '{raw}' is out of range"),
    })
}

/// Renders the short usage text for `--help` (spec §6: "print usage and
/// immediately exit 0").
#[must_use]
pub fn help_text(topic: HelpTopic) -> &'static str {
    match topic {
        HelpTopic::Root => {
            "wiggum — a monorepo workspace runner\n\n\
             USAGE:\n    wiggum projects [list|graph] [options]\n    wiggum run <task> [options] [-- task args]\n\n\
             Run 'wiggum projects --help' or 'wiggum run --help' for subcommand options.\n\n\
             -v, --verbose can be repeated to raise log verbosity (info, then debug)."
        }
        HelpTopic::Projects | HelpTopic::ProjectsList | HelpTopic::ProjectsGraph => {
            "wiggum projects [list|graph] [options]\n\n\
             List (default) or graph the discovered projects.\n\n\
             OPTIONS:\n    --root <path>         Workspace root (default: current directory)\n    \
             --config <path>       Explicit runner config file\n    \
             --project, -p <pat>    Comma-separated wildcard filters, repeatable, `!`-prefixed to exclude\n    \
             --json                 JSON output\n    --no-infer-imports     Disable inferred-import edges\n    \
             -v, --verbose          Raise log verbosity, repeatable"
        }
        HelpTopic::Run | HelpTopic::RunTask => {
            "wiggum run <task> [options] [-- task args]\n\n\
             Executes <task> across every discovered project in dependency order.\n\n\
             OPTIONS:\n    --root <path>              Workspace root (default: current directory)\n    \
             --config <path>            Explicit runner config file\n    \
             --project, -p <pat>        Comma-separated wildcard filters, repeatable\n    \
             --parallel, --concurrency <n>   Worker-pool size\n    \
             --dry-run                  Plan only, don't execute\n    \
             --json                     JSON output (with --dry-run)\n    \
             --no-infer-imports         Disable inferred-import edges\n    \
             --ai-prompt                Print a remediation prompt on failure\n    \
             --autofix                  Alias for --ai-prompt (non-interactive)\n    \
             -v, --verbose              Raise log verbosity, repeatable"
        }
    }
}
