//! Resolver Error Types
//!
//! Contract violations and engine faults end the current attempt.
//! Recoverable rejections are not errors, see `resolver::RejectReason`.

use thiserror::Error;

/// Central error type for the recognition resolver
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Double show, dismissing a prompt that isn't active, and similar misuse
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// A derivation tree whose children don't add up to their parent
    #[error("Invalid rule tree: {0}")]
    InvalidRule(String),

    #[error("Recognition engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for ResolverError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        ResolverError::Lock(err.to_string())
    }
}
