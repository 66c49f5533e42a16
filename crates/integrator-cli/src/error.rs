//! CLI error types

use std::path::PathBuf;

use integrator_core::{IntegratorError, StoreError};
use integrator_types::RelationId;
use thiserror::Error;

/// Errors surfaced by the hook runner
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Integrator(#[from] IntegratorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("state file {path}: {source}")]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    StateCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("relation {0} does not exist")]
    UnknownRelation(RelationId),

    #[error("action {action} failed: {message}")]
    ActionFailed { action: String, message: String },
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
