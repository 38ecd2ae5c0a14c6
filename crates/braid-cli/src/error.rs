//! CLI error hierarchy.
//!
//! [`CliError`] is the top of the error tree: configuration and build
//! errors convert into it via `#[from]`, and `main` renders the final
//! value through [`cli_error_to_miette`]. The underlying errors already
//! carry their own `Hint:` trailers, so this layer only adds the broad
//! category.

use std::path::PathBuf;

use thiserror::Error;

mod miette;

pub use miette::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] braid_config::ConfigError),

    /// A build stage failed.
    #[error("Build error: {0}")]
    Build(#[from] braid_bundler::BuildError),

    /// Invalid command-line arguments or options.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A file or directory the command needs does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O failure outside the build pipeline.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server failure.
    #[error("Server error: {0}")]
    Server(String),

    /// File watcher failure.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type alias with [`CliError`] as the default error.
pub type Result<T, E = CliError> = std::result::Result<T, E>;
