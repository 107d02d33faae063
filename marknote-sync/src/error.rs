//! Error types for the sync layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Sync is switched off or no API key is configured.
    #[error("sync is not enabled")]
    Disabled,

    /// TLS certificate validation failed.
    #[error("TLS certificate validation failed: {0}")]
    TlsValidation(String),

    /// Could not reach the server.
    #[error("failed to connect to server: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-200 status.
    #[error("server returned HTTP {status}")]
    Server { status: u16 },

    /// Transport-level failure that is none of the above, or a
    /// malformed response body.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server reported a failure for the operation.
    #[error("server rejected the operation: {0}")]
    Rejected(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local file read/write failure.
    #[error("local I/O error on {path}: {source}")]
    LocalIo {
        /// The file involved.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// Config/mapping persistence failure.
    #[error("store error: {0}")]
    Store(#[from] marknote_store::StoreError),

    /// A reconciliation pass is already in flight.
    #[error("a sync pass is already running")]
    AlreadyRunning,

    /// The pass was cancelled cooperatively.
    #[error("sync cancelled")]
    Cancelled,
}
