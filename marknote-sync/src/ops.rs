//! Single-note operations: upload, download, delete, listing and search.
//!
//! Every operation resolves or records a local↔cloud path mapping
//! through the configuration store, and short-circuits with
//! [`SyncError::Disabled`] before any network call when sync is off.

use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    DownloadResponse, ListResponse, MutationResponse, NOTES_PATH, SEARCH_PATH, SearchHit,
    SearchResponse, UploadRequest,
};
use crate::transport::{Method, Transport};
use marknote_store::ConfigStore;
use marknote_types::{RemoteNote, synthesize_dir_records};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Note operations against the remote store.
///
/// Cheap to share; ad-hoc UI calls and the reconciliation engine use the
/// same instance. Mapping mutations are serialized by the store itself.
pub struct NoteOps {
    store: Arc<ConfigStore>,
    transport: Arc<dyn Transport>,
}

impl NoteOps {
    /// Creates the operations facade over a store and a transport.
    pub fn new(store: Arc<ConfigStore>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    fn ensure_enabled(&self) -> SyncResult<()> {
        if self.store.is_sync_enabled() {
            Ok(())
        } else {
            Err(SyncError::Disabled)
        }
    }

    /// Resolves the cloud path for a local file: existing mapping first,
    /// else the path relative to the notes root, else the bare file name
    /// (one-off imports living outside the notes tree).
    pub fn resolve_cloud_path(&self, local_path: &Path) -> String {
        if let Some(cloud) = self.store.mapping(local_path) {
            return cloud;
        }
        let root = self.store.notes_dir();
        match local_path.strip_prefix(&root) {
            Ok(relative) => {
                let cloud = cloud_path_from_relative(relative);
                debug!(local = %local_path.display(), cloud = %cloud, "derived cloud path from notes root");
                cloud
            }
            Err(_) => {
                let cloud = local_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                debug!(local = %local_path.display(), cloud = %cloud, "file outside notes root, using base name");
                cloud
            }
        }
    }

    /// Local path for a cloud path: reverse mapping lookup, else
    /// synthesized under the notes root.
    pub fn resolve_local_path(&self, cloud_path: &str) -> PathBuf {
        self.store
            .local_for_cloud(cloud_path)
            .unwrap_or_else(|| self.store.notes_dir().join(cloud_path))
    }

    /// Uploads a note.
    ///
    /// When `content` is `None` it is read from disk; a read failure is
    /// terminal for this call. On success the resolved mapping is
    /// recorded and the cloud path returned.
    pub async fn upload_note(
        &self,
        local_path: &Path,
        content: Option<&str>,
    ) -> SyncResult<String> {
        self.ensure_enabled()?;

        let cloud_path = self.resolve_cloud_path(local_path);
        let content = match content {
            Some(c) => c.to_string(),
            None => read_note(local_path)?,
        };

        let body = serde_json::to_value(UploadRequest {
            path: cloud_path.clone(),
            content,
        })?;
        let value = self
            .transport
            .request_json(Method::Post, NOTES_PATH, Some(body), &[])
            .await?;
        let response: MutationResponse = parse(value)?;
        if !response.success {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }

        if let Err(e) = self.store.set_mapping(local_path, &cloud_path) {
            warn!(
                "failed to persist mapping for {}: {e}",
                local_path.display()
            );
        }
        info!(local = %local_path.display(), cloud = %cloud_path, "note uploaded");
        Ok(cloud_path)
    }

    /// Downloads a note's content.
    ///
    /// When `local_path` is `None` the mapping table is searched for the
    /// cloud path, falling back to `<notes_dir>/<cloud_path>`. The
    /// resolved mapping is recorded whenever the download itself
    /// succeeds, whether or not the caller persists the content.
    pub async fn download_note(
        &self,
        cloud_path: &str,
        local_path: Option<&Path>,
    ) -> SyncResult<String> {
        self.ensure_enabled()?;

        let local_path = match local_path {
            Some(p) => p.to_path_buf(),
            None => self.resolve_local_path(cloud_path),
        };

        let logical = format!("{NOTES_PATH}/{cloud_path}");
        let value = self
            .transport
            .request_json(Method::Get, &logical, None, &[])
            .await?;
        let response: DownloadResponse = parse(value)?;
        let Some(content) = response.content else {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "unknown error".into()),
            ));
        };

        if let Err(e) = self.store.set_mapping(&local_path, cloud_path) {
            warn!("failed to persist mapping for {cloud_path}: {e}");
        }
        info!(cloud = %cloud_path, local = %local_path.display(), "note downloaded");
        Ok(content)
    }

    /// Deletes a note, or a folder's worth of notes, on the server.
    ///
    /// On success every mapping whose cloud path equals `cloud_path` or
    /// lies under `cloud_path + "/"` is removed, so one call covers a
    /// whole folder even though the server reports a single flag.
    pub async fn delete_note(&self, cloud_path: &str) -> SyncResult<()> {
        self.ensure_enabled()?;

        let logical = format!("{NOTES_PATH}/{cloud_path}");
        let value = self
            .transport
            .request_json(Method::Delete, &logical, None, &[])
            .await?;
        let response: MutationResponse = parse(value)?;
        if !response.success {
            return Err(SyncError::Rejected(
                response.error.unwrap_or_else(|| "unknown error".into()),
            ));
        }

        match self.store.remove_mappings_under(cloud_path) {
            Ok(removed) => info!(cloud = %cloud_path, removed, "note deleted"),
            Err(e) => warn!("failed to persist mapping removal for {cloud_path}: {e}"),
        }
        Ok(())
    }

    /// Lists the notes on the server.
    ///
    /// The server returns only file records; directory records are
    /// synthesized client-side from the ancestor segments and appended.
    pub async fn list_remote_notes(&self) -> SyncResult<Vec<RemoteNote>> {
        self.ensure_enabled()?;

        let value = self
            .transport
            .request_json(Method::Get, NOTES_PATH, None, &[])
            .await?;
        let response: ListResponse = parse(value)?;

        let mut notes = response.notes;
        let folders = synthesize_dir_records(&notes);
        notes.extend(folders);
        Ok(notes)
    }

    /// Searches note contents on the server.
    pub async fn search_remote_notes(&self, keyword: &str) -> SyncResult<Vec<SearchHit>> {
        self.ensure_enabled()?;

        let value = self
            .transport
            .request_json(Method::Get, SEARCH_PATH, None, &[("keyword", keyword)])
            .await?;
        let response: SearchResponse = parse(value)?;
        Ok(response.results)
    }
}

/// Reads a note's UTF-8 content from disk.
pub fn read_note(path: &Path) -> SyncResult<String> {
    std::fs::read_to_string(path).map_err(|source| SyncError::LocalIo {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a note to disk, creating parent directories as needed.
pub fn write_note(path: &Path, content: &str) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SyncError::LocalIo {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| SyncError::LocalIo {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: DeserializeOwned>(value: Value) -> SyncResult<T> {
    serde_json::from_value(value)
        .map_err(|e| SyncError::Protocol(format!("unexpected response shape: {e}")))
}

/// Joins the components of a root-relative path with `/`, the cloud
/// path convention, independent of the local separator.
fn cloud_path_from_relative(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
