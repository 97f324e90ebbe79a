//! Error types for testtiming-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or validating client configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the requested path.
    #[error("config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// A config value is outside its accepted range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
