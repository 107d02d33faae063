//! Wire types for the note server protocol.
//!
//! Response body shapes: `{"success": bool, "error": string?}` for
//! mutating calls, `{"content": string}` for download, `{"notes": [...]}`
//! for listing, `{"to_upload"/"to_download"/"to_delete": [...]}` for the
//! manifest exchange, and `{"results": [...]}` for remote search.

use marknote_types::RemoteNote;
use serde::{Deserialize, Serialize};

/// Logical path for single-note and listing operations.
pub const NOTES_PATH: &str = "api/v1/notes";
/// Logical path for the manifest exchange.
pub const SYNC_PATH: &str = "api/v1/sync";
/// Logical path for remote keyword search.
pub const SEARCH_PATH: &str = "api/v1/search";

/// Response to a mutating call (upload/delete).
#[derive(Debug, Clone, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response to a download request.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of an upload request.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest {
    /// Cloud-relative path for the note.
    pub path: String,
    /// The note's full content.
    pub content: String,
}

/// Response to a listing request.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub notes: Vec<RemoteNote>,
}

/// One entry of the manifest sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Cloud-relative path of the local note.
    pub path: String,
    /// Local modification time, seconds since the Unix epoch.
    pub last_modified: u64,
}

/// The manifest of local notes submitted for diffing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestRequest {
    pub notes: Vec<ManifestEntry>,
}

/// One entry of the server's reconciliation plan. Only the path matters
/// to the client; the server echoes manifest-style records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanEntry {
    pub path: String,
    #[serde(default)]
    pub last_modified: u64,
}

/// The server's reconciliation plan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncPlan {
    #[serde(default)]
    pub to_upload: Vec<PlanEntry>,
    #[serde(default)]
    pub to_download: Vec<PlanEntry>,
    #[serde(default)]
    pub to_delete: Vec<PlanEntry>,
}

/// A remote search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    /// Cloud-relative path of the matching note.
    pub path: String,
    #[serde(default)]
    pub filename: String,
    /// A snippet of content around the first match.
    #[serde(default)]
    pub context: String,
    /// Total number of matches in the note.
    #[serde(default)]
    pub matches: u64,
}

/// Response to a search request.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}
