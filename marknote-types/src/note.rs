//! Local and remote note records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A note found on disk during a local scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalNote {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// Last modification time, seconds since the Unix epoch.
    pub last_modified: u64,
}

/// A note (or synthesized folder) in the remote store.
///
/// The server returns only file records; folder records are synthesized
/// client-side from the ancestor segments of the file paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNote {
    /// Cloud-relative POSIX path.
    pub path: String,
    /// Base name of the file or folder.
    #[serde(default)]
    pub filename: String,
    /// Last modification time, seconds since the Unix epoch.
    #[serde(default)]
    pub last_modified: u64,
    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
    /// True for synthesized folder records.
    #[serde(default)]
    pub is_dir: bool,
}

impl RemoteNote {
    /// Creates a folder record for a cloud path.
    pub fn folder(path: impl Into<String>) -> Self {
        let path = path.into();
        let filename = path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            path,
            filename,
            last_modified: 0,
            size: 0,
            is_dir: true,
        }
    }
}

/// Derives folder records from the ancestor segments of every file path
/// in `notes`, deduplicated and in path order.
///
/// A file `a/b/c.md` contributes the folders `a` and `a/b`; root-level
/// files contribute nothing.
pub fn synthesize_dir_records(notes: &[RemoteNote]) -> Vec<RemoteNote> {
    let mut folders = BTreeSet::new();
    for note in notes {
        let segments: Vec<&str> = note.path.split('/').collect();
        let mut current = String::new();
        for part in &segments[..segments.len().saturating_sub(1)] {
            if part.is_empty() {
                continue;
            }
            if current.is_empty() {
                current = (*part).to_string();
            } else {
                current = format!("{current}/{part}");
            }
            folders.insert(current.clone());
        }
    }
    folders.into_iter().map(RemoteNote::folder).collect()
}
