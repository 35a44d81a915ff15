//! Error types for the HYMLS preconditioner core.
//!
//! Follows the taxonomy from the design: configuration errors (bad
//! parameters, mismatched grid/dof), structural errors (map mismatches,
//! calling `apply` before `compute`), numerical errors (singular
//! subdomain/coarse solves), and I/O (debug dumps, warning-only elsewhere).

use thiserror::Error;

/// Main error type for HYMLS operations.
#[derive(Error, Debug)]
pub enum HymlsError {
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("map mismatch: {0}")]
    MapMismatch(String),

    #[error("border mismatch: {0}")]
    BorderMismatch(String),

    #[error("preconditioner not computed - call compute() first")]
    NotComputed,

    #[error("preconditioner not initialized - call initialize() first")]
    NotInitialized,

    #[error("singular subdomain matrix on subdomain {0}")]
    SingularSubdomain(usize),

    #[error("singular or indefinite coarse solve: {0}")]
    CoarseSolveFailed(String),

    #[error("Krylov solver failed to converge after {0} iterations (relative residual {1:e})")]
    ConvergenceFailed(usize, f64),

    #[error("index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for HYMLS operations.
pub type HymlsResult<T> = Result<T, HymlsError>;
