//! Logging setup for the CLI.
//!
//! Builds a `tracing-subscriber` registry with an environment filter and a
//! compact formatter. Verbosity comes from the global flags: `--verbose`
//! raises the braid crates to debug, `--quiet` drops everything below
//! error, and otherwise `RUST_LOG` is respected with an info-level
//! default.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Call once at startup before any log statement runs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("braid_cli=debug,braid_bundler=debug,braid_config=debug,braid_graph=debug")
    } else if quiet {
        EnvFilter::new("braid_cli=error,braid_bundler=error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("braid_cli=info,braid_bundler=info,braid_config=info")
        })
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
