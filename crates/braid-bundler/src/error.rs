//! Error types for the bundler pipeline.
//!
//! Every stage failure maps to one of these variants and aborts the
//! build. Nothing is written to the output directory once an error
//! has been raised.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias used throughout the bundler.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// Errors raised while resolving, compiling, linking or staging a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// An import specifier could not be mapped to a file on disk.
    #[error("Failed to resolve '{specifier}' imported by {importer}\n\nHint: {hint}")]
    Resolve {
        /// The specifier as written in the source file.
        specifier: String,
        /// The module whose import failed.
        importer: PathBuf,
        /// What was tried, or why the specifier is not resolvable.
        hint: String,
    },

    /// A module failed to parse or lower.
    #[error("Failed to compile {path}\n\n{diagnostic}")]
    Compile {
        /// The module that failed.
        path: PathBuf,
        /// Diagnostic text from the parser or transformer.
        diagnostic: String,
    },

    /// A module of a kind the bundler cannot link was reached.
    #[error("Unsupported module {path}\n\nHint: {hint}")]
    UnsupportedModule {
        /// The offending module.
        path: PathBuf,
        /// Why it cannot be linked, and what to do about it.
        hint: String,
    },

    /// An import cycle the runtime cannot lazily untangle.
    #[error("Dependency cycle cannot be ordered: {cycle}\n\nHint: {hint}")]
    DependencyCycle {
        /// The cycle rendered as `a -> b -> a`.
        cycle: String,
        /// Which construct made the cycle unresolvable.
        hint: String,
    },

    /// A configured copy target does not exist in the project root.
    #[error("Missing asset: {path}\n\nHint: Copy targets are read from the project root. Create the file or remove it from the copy list.")]
    MissingAsset {
        /// The absolute path that was probed.
        path: PathBuf,
    },

    /// An output file would land outside the output directory.
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// Writing the staged files to disk failed partway through.
    #[error("Failed to write output: {0}")]
    WriteFailure(String),

    /// Reading a source file or asset failed for a reason other than absence.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Short machine-friendly tag for logs and the dev server status payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolve",
            Self::Compile { .. } => "compile",
            Self::UnsupportedModule { .. } => "unsupported-module",
            Self::DependencyCycle { .. } => "dependency-cycle",
            Self::MissingAsset { .. } => "missing-asset",
            Self::InvalidOutputPath(_) => "invalid-output-path",
            Self::WriteFailure(_) => "write-failure",
            Self::Io { .. } => "io",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_includes_hint() {
        let err = BuildError::Resolve {
            specifier: "./missing".to_string(),
            importer: PathBuf::from("src/index.ts"),
            hint: "Checked the literal path and extensions".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("./missing"));
        assert!(text.contains("Hint:"));
    }

    #[test]
    fn error_kinds_are_stable() {
        let err = BuildError::MissingAsset { path: PathBuf::from("index.html") };
        assert_eq!(err.kind(), "missing-asset");
    }
}
