//! Braid CLI entry point.
//!
//! Parses command-line arguments, initializes logging and color support,
//! and dispatches to the requested command.

use braid_cli::{cli, commands, error, logger, ui};
use clap::Parser;
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors();

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Serve(serve_args) => commands::serve_execute(serve_args).await,
    };

    // Render CLI errors through miette for readable terminal reports.
    result.map_err(error::cli_error_to_miette)
}
