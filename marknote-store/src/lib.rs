//! Persistent configuration and path-mapping store for Marknote.
//!
//! One JSON document on disk holds the application settings and the sync
//! settings, including the mapping from local absolute paths to
//! cloud-relative paths. Every write persists the whole document
//! immediately, so a crash mid-sync loses at most the in-flight
//! operation, never prior progress.

mod error;
mod settings;
mod store;

pub use error::{StoreError, StoreResult};
pub use settings::{AppSettings, ConfigDocument, SyncSettings, keys, truthy};
pub use store::{ConfigStore, normalize_path};
