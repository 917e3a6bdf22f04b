//! The `wiggum` binary's concrete [`TaskResolver`] (spec §6: "Supported
//! task names are a closed set that maps to underlying tools"). Locating
//! and invoking the underlying build tool is explicitly out of scope for
//! `wiggum_runner` itself (spec §1) — this is the seam the hosting CLI
//! fills in, grounded on the common npm-script convention (`npm run
//! <task>`) rather than a registry of per-task binaries.

use wiggum_runner::plan::{TableTaskResolver, TaskResolver};

/// Builds the default task resolver: every supported task runs through
/// `npm run <task>` in the project's own directory.
#[must_use]
pub fn default_resolver() -> impl TaskResolver {
    TableTaskResolver::new(vec![
        ("build", "npm"),
        ("test", "npm"),
        ("lint", "npm"),
        ("typecheck", "npm"),
    ])
}
