//! Error types for abgabe-provision.

use std::path::PathBuf;

use thiserror::Error;

use abgabe_core::PlatformError;

use crate::reconcile::ResourceKind;

/// Failures of find-or-create reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The platform rejected a search or a creation that could not be
    /// recovered by searching again.
    #[error("{kind} '{key}': {source}")]
    Platform {
        kind: ResourceKind,
        key: String,
        #[source]
        source: PlatformError,
    },

    /// An object a dependent operation needs does not exist.
    #[error("missing prerequisite: {kind} '{key}' does not exist")]
    MissingPrerequisite { kind: ResourceKind, key: String },

    /// The search found objects, but none with exactly the wanted name.
    #[error("{kind} search for '{key}' found only non-matching names: {}", .found.join(", "))]
    NameMismatch {
        kind: ResourceKind,
        key: String,
        found: Vec<String>,
    },
}

impl ReconcileError {
    pub fn is_missing_prerequisite(&self) -> bool {
        matches!(self, ReconcileError::MissingPrerequisite { .. })
    }
}

/// A spawned program could not run or exited unsuccessfully.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// All errors that can arise from provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to generate password: {0}")]
    Random(String),
}

/// Convenience constructor for [`ProvisionError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ProvisionError {
    ProvisionError::Io {
        path: path.into(),
        source,
    }
}
