//! Error types for the integrator core.

use integrator_types::RelationId;
use thiserror::Error;

/// Result type for integrator operations.
pub type Result<T> = std::result::Result<T, IntegratorError>;

/// Errors raised by relation stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("relation not found: {0}")]
    RelationNotFound(RelationId),
}

/// Top-level errors for the integrator core.
///
/// Not-ready conditions never show up here; they are reported as deferrals.
#[derive(Debug, Error)]
pub enum IntegratorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
