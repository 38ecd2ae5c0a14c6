//! Miette rendering for CLI errors.

use miette::Report;

use crate::error::CliError;

/// Convert a [`CliError`] into a miette report for terminal display.
///
/// Build errors get a diagnostic code derived from their stage tag, so a
/// failed invocation shows `braid::build::resolve` and similar next to
/// the message.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => {
            let code = format!("braid::build::{}", e.kind());
            miette::miette!(code = code, "{e}")
        }
        CliError::Config(e) => miette::miette!(code = "braid::config", "{e}"),
        other => miette::miette!("{other}"),
    }
}
