//! Local/cloud note synchronization engine for Marknote.
//!
//! Keeps a local directory of Markdown files consistent with a remote
//! note store that is reachable through a single multiplexing HTTP
//! endpoint: every logical operation travels in the `api_path` query
//! parameter rather than a REST path.
//!
//! # Architecture
//!
//! - **Transport**: issues authenticated requests against the one
//!   endpoint and classifies failures
//! - **Protocol**: the JSON bodies exchanged with the server
//! - **Note operations**: upload/download/delete a single note, resolving
//!   local↔cloud path mappings through the configuration store
//! - **Engine**: drives one reconciliation pass and reports progress
//!
//! # Sync pass
//!
//! 1. Pre-flight connectivity check
//! 2. Scan the local notes tree
//! 3. Exchange a manifest with the server, receiving a plan
//! 4. Apply the plan (downloads, then uploads) best-effort
//! 5. Record the sync time and emit a summary
//!
//! The pass runs as a background task; progress arrives through a
//! one-way event channel so a UI thread is never blocked.

mod engine;
mod error;
pub mod ops;
pub mod protocol;
pub mod scanner;
pub mod transport;

pub use engine::{CancelToken, SyncEngine, SyncEvent, SyncPhase, SyncSummary};
pub use error::{SyncError, SyncResult};
pub use ops::NoteOps;
pub use transport::{ApiTransport, Method, Transport};
