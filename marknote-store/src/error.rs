//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while loading or persisting the config document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem read/write failure.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed config document.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
