//! The `verity` command-line entry point.
//!
//! Parses arguments, runs the discovered features through the selected
//! reporter and turns the outcome into a process exit status.

use std::sync::Once;

use clap::Parser;

use crate::errors::VerityError;
use crate::loader::{FsModuleLoader, ModuleRegistry};
use crate::reporter;
use crate::runtime::Runner;

mod args;

pub use args::VerityArgs;

/// Environment variable holding the log filter, e.g. `VERITY_LOG=verity=debug`.
pub const LOG_ENV: &str = "VERITY_LOG";

static TRACING_INIT: Once = Once::new();

/// Installs the global log subscriber, once, and only when [`LOG_ENV`] is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var(LOG_ENV).is_ok() {
            let filter = EnvFilter::from_env(LOG_ENV);
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    });
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// Runs the command line with no in-process modules registered.
pub fn run() -> i32 {
    run_with(VerityArgs::parse(), ModuleRegistry::new())
}

/// Runs the command line, resolving non-YAML test files against `registry`.
///
/// Returns the exit status: 0 when everything passed, the `FAILURE` or
/// `ERROR` code otherwise (errors win), the internal runtime error code when
/// the runtime itself broke, and 1 when discovery or configuration failed.
pub fn run_with(args: VerityArgs, registry: ModuleRegistry) -> i32 {
    init_tracing();

    let options = match args.options() {
        Ok(options) => options,
        Err(error) => return report_error(error),
    };
    let Some(mut reporter) = reporter::by_name(&args.reporter) else {
        return report_error(VerityError::Config {
            message: format!("unknown reporter '{}'", args.reporter),
        });
    };

    let runner = Runner::new(FsModuleLoader::new(registry), options);
    match runner.run(&args.paths, reporter.as_mut()) {
        Ok(results) => results.exit_status(),
        // Already handed to the reporter.
        Err(VerityError::InternalRuntime(error)) => error.status_code(),
        Err(error) => report_error(error),
    }
}

fn report_error(error: VerityError) -> i32 {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
    1
}
