//! Command-line interface definition.
//!
//! The whole surface is defined here with clap's derive macros: global
//! flags on [`Cli`], one [`Command`] variant per subcommand, and an args
//! struct per command. Values that are not given on the command line fall
//! through to `braid.toml`, `BRAID_*` environment variables, and the
//! built-in defaults, in that order.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Braid - a small bundler for TypeScript web apps
#[derive(Parser, Debug)]
#[command(
    name = "braid",
    version,
    about = "Bundle TypeScript and WebAssembly modules for the browser",
    long_about = "Braid resolves a module graph from one entry point, compiles \
                  TypeScript per configured rules, links everything into a single \
                  bundle, and stages copied assets next to it. The serve command \
                  adds a watcher and a live-reload development server."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all log output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project into the output directory
    ///
    /// Runs the full pipeline once. Nothing is written unless every module
    /// resolves, compiles and links cleanly and every copied asset exists.
    Build(BuildArgs),

    /// Build, watch and serve the project with live reload
    ///
    /// Runs an initial build, then rebuilds on file changes and serves the
    /// output directory over local HTTP. A failed rebuild keeps the previous
    /// output in place.
    Serve(ServeArgs),
}

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project root directory
    ///
    /// All relative paths, including the entry module and copy targets,
    /// resolve against this directory. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Build with production optimizations
    ///
    /// Minifies the bundle and drops debug instrumentation such as module
    /// banners. Without this flag the mode comes from BRAID_PRODUCTION or
    /// braid.toml, defaulting to development.
    #[arg(long)]
    pub production: bool,

    /// Entry module, relative to the project root
    #[arg(long, value_name = "FILE")]
    pub entry: Option<String>,

    /// Output directory for the bundle and copied assets
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Remove stale files from the output directory before writing
    #[arg(long)]
    pub clean: bool,

    /// Path to an explicit configuration file
    ///
    /// Without this flag, braid.toml under the project root is used when
    /// present.
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Project root directory
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Serve a production build
    ///
    /// The dev server normally serves development builds; this switches the
    /// rebuild loop to minified output.
    #[arg(long)]
    pub production: bool,

    /// Port to listen on
    ///
    /// When the port is busy the next free port in a small range is used
    /// and a warning is printed.
    #[arg(short, long, default_value = "8080", value_name = "PORT")]
    pub port: u16,

    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1", value_name = "HOST")]
    pub host: IpAddr,

    /// Open the served page in the default browser
    #[arg(long)]
    pub open: bool,

    /// Path to an explicit configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
