//! Crate-level error types.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error aggregating the concerns of the crate.
#[derive(Error, Debug)]
pub enum ThemeupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Update error: {0}")]
    Update(#[from] crate::update::UpdateError),
}

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for crate-level operations.
pub type Result<T> = std::result::Result<T, ThemeupError>;
