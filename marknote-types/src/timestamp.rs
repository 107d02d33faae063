//! Epoch-second timestamp helpers.
//!
//! The wire protocol and the persisted settings both use plain seconds
//! since the Unix epoch, so no richer time type is warranted.

use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Modification time of a file in seconds since the Unix epoch.
///
/// Files with unreadable or pre-epoch mtimes report 0.
pub fn mtime_epoch(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
