//! # braid-cli
//!
//! Command-line interface for the braid bundler. Two commands cover the
//! whole workflow: `braid build` runs the pipeline once and commits the
//! output directory, `braid serve` keeps a development server running with
//! rebuild-on-change and live reload.
//!
//! Modules:
//!
//! - [`cli`] - argument definitions (clap derive)
//! - [`commands`] - one module per subcommand
//! - [`dev`] - development server: watcher, shared state, HTTP endpoint
//! - [`error`] - CLI error hierarchy and miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines and formatting for the terminal

pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
