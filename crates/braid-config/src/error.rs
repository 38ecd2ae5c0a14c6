//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Project root not found: {path}\n\nHint: Pass --root or run braid from the project directory"
    )]
    RootNotFound { path: PathBuf },

    #[error("Failed to read configuration: {reason}\n\nHint: Check braid.toml syntax and field types")]
    Extract { reason: String },

    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, value: impl Into<String>, hint: &str) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.into(),
            hint: hint.to_string(),
        }
    }
}
