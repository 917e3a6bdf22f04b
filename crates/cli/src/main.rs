//! Entry point for the `wiggum` binary.
//!
//! # What
//! Parses argv, captures the environment overrides once, dispatches into
//! [`wiggum_cli::run::dispatch`], and converts the result into a process
//! exit code.
//!
//! # How
//! Everything past argument collection and environment capture lives in
//! the library (`wiggum_cli`), so this file stays a thin wrapper around a
//! single-threaded tokio runtime.
//!
//! # Why
//! Keeping `std::env::args`, `std::process::exit`, and the runtime
//! bootstrap isolated to `main` is what lets the rest of the crate be
//! driven directly from tests instead of only through `assert_cmd`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::panic)]
#![allow(clippy::exit)] // Required for main entry point

use std::process;

use wiggum_cli::env_overrides::EnvOverrides;
use wiggum_cli::error::CliError;
use wiggum_cli::{args, logging, run};

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let env = EnvOverrides::capture();

    let exit_code = match args::parse(&argv) {
        Ok(parsed) => {
            logging::init(parsed.options.verbosity);
            let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build();
            match runtime {
                Ok(rt) => match rt.block_on(run::dispatch(parsed, &env)) {
                    Ok(code) => code,
                    Err(e) => report(&e),
                },
                Err(e) => {
                    eprintln!("error: failed to start async runtime: {e}");
                    1
                }
            }
        }
        Err(e) => {
            logging::init(0);
            report(&e)
        }
    };

    process::exit(exit_code);
}

fn report(error: &CliError) -> i32 {
    eprintln!("error: {error}");
    error.exit_code()
}
