//! Logging setup (SPEC_FULL §10). `RUST_LOG` controls verbosity the usual
//! `env_logger` way and always wins when set; absent that, the default
//! filter steps with the `-v`/`--verbose` flag count (0 -> `warn`, 1 ->
//! `info`, 2+ -> `debug`). Log lines go to stderr, keeping stdout free
//! for `--json`/plan output.

/// Initializes the global logger at the filter implied by `verbosity`
/// repetitions of `-v`/`--verbose`. Safe to call more than once in tests;
/// subsequent calls are no-ops (`env_logger::Builder::try_init` swallows
/// the "already initialized" error).
pub fn init(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}
