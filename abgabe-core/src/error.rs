//! Error types for abgabe-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading a roster export.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV (unbalanced quotes, ragged row, ...).
    #[error("malformed roster CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks one of the columns the roster must carry.
    #[error("roster is missing required column '{column}'")]
    MissingColumn { column: &'static str },
}

/// Errors from loading or completing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.abgabesystem/`.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,

    /// A setting needed by the requested command is not configured anywhere.
    #[error("missing setting '{key}': set it in {path} or via {env}")]
    Missing {
        key: &'static str,
        path: PathBuf,
        env: &'static str,
    },
}
