//! The configuration store.

use crate::error::StoreResult;
use crate::settings::{ConfigDocument, keys, truthy};
use marknote_types::unix_now;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// The persistent configuration and path-mapping store.
///
/// The in-memory document is authoritative: every write updates memory
/// first and then persists the whole document. A persistence failure is
/// reported to the caller but leaves the in-memory state in place until
/// the next successful write.
///
/// All access goes through an internal mutex, so concurrent note
/// operations serialize their read-modify-write cycles on the mapping
/// table.
pub struct ConfigStore {
    path: PathBuf,
    doc: Mutex<ConfigDocument>,
}

impl ConfigStore {
    /// Opens the store at `path`, falling back to a default document
    /// rooted at `notes_dir` when the file is missing or malformed.
    pub fn open(path: impl Into<PathBuf>, notes_dir: impl AsRef<Path>) -> Self {
        let path = path.into();
        let mut doc = ConfigDocument::with_notes_dir(notes_dir.as_ref());

        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<ConfigDocument>(&raw) {
                Ok(loaded) => {
                    // Merge over the defaults so keys absent from older
                    // documents keep their default values.
                    if !loaded.app_settings.notes_dir.as_os_str().is_empty() {
                        doc.app_settings = loaded.app_settings;
                    }
                    doc.sync_settings.file_mapping = loaded.sync_settings.file_mapping;
                    for (key, value) in loaded.sync_settings.values {
                        doc.sync_settings.values.insert(key, value);
                    }
                }
                Err(e) => warn!(
                    "config file {} is malformed, using defaults: {e}",
                    path.display()
                ),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to read config file {}: {e}", path.display()),
        }

        Self {
            path,
            doc: Mutex::new(doc),
        }
    }

    /// Where the document is persisted.
    pub fn config_path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, doc: &ConfigDocument) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    // ── Settings namespace ───────────────────────────────────────

    /// Gets a value from the sync settings namespace.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.doc.lock().sync_settings.values.get(key).cloned()
    }

    /// Gets a value from the sync settings namespace, with a default.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Sets a value in the sync settings namespace and persists the
    /// document immediately.
    pub fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let mut doc = self.doc.lock();
        doc.sync_settings.values.insert(key.to_string(), value);
        self.persist(&doc)
    }

    /// Root directory of the local notes tree.
    pub fn notes_dir(&self) -> PathBuf {
        self.doc.lock().app_settings.notes_dir.clone()
    }

    /// Base URL of the server endpoint.
    pub fn server_url(&self) -> String {
        self.string_setting(keys::SERVER_URL)
    }

    /// Sets the server base URL.
    pub fn set_server_url(&self, url: &str) -> StoreResult<()> {
        self.set(keys::SERVER_URL, Value::String(url.to_string()))
    }

    /// The stored API key (bearer token).
    pub fn api_key(&self) -> String {
        self.string_setting(keys::API_KEY)
    }

    /// Sets the API key.
    pub fn set_api_key(&self, api_key: &str) -> StoreResult<()> {
        self.set(keys::API_KEY, Value::String(api_key.to_string()))
    }

    /// Switches sync on or off. Sync is only effective once an API key
    /// is present; see [`ConfigStore::is_sync_enabled`].
    pub fn set_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.set(keys::ENABLED, Value::Bool(enabled))
    }

    /// True iff the enabled flag is set and an API key is present.
    ///
    /// The flag is normalized from legacy string forms, so a document
    /// carrying `"enabled": "true"` behaves like a bool.
    pub fn is_sync_enabled(&self) -> bool {
        let doc = self.doc.lock();
        let enabled = doc
            .sync_settings
            .values
            .get(keys::ENABLED)
            .map(truthy)
            .unwrap_or(false);
        let has_key = doc
            .sync_settings
            .values
            .get(keys::API_KEY)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty());
        enabled && has_key
    }

    /// Completion time of the last successful sync pass (epoch seconds).
    pub fn last_sync_time(&self) -> u64 {
        self.doc
            .lock()
            .sync_settings
            .values
            .get(keys::LAST_SYNC_TIME)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Records the current wall-clock time as the last sync time.
    pub fn touch_last_sync_time(&self) -> StoreResult<()> {
        self.set(keys::LAST_SYNC_TIME, Value::from(unix_now()))
    }

    fn string_setting(&self, key: &str) -> String {
        self.doc
            .lock()
            .sync_settings
            .values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    // ── File mapping ─────────────────────────────────────────────

    /// Cloud path mapped to a local path. The key is tried as given,
    /// then in normalized form; callers need not normalize upstream.
    pub fn mapping(&self, local_path: &Path) -> Option<String> {
        let doc = self.doc.lock();
        let map = &doc.sync_settings.file_mapping;
        let raw = local_path.to_string_lossy();
        if let Some(cloud) = map.get(raw.as_ref()) {
            return Some(cloud.clone());
        }
        map.get(&normalize_path(local_path)).cloned()
    }

    /// Records a mapping, normalizing the local path at the store
    /// boundary. Idempotent.
    pub fn set_mapping(&self, local_path: &Path, cloud_path: &str) -> StoreResult<()> {
        let key = normalize_path(local_path);
        debug!(local = %key, cloud = %cloud_path, "recording mapping");
        let mut doc = self.doc.lock();
        doc.sync_settings
            .file_mapping
            .insert(key, cloud_path.to_string());
        self.persist(&doc)
    }

    /// Removes the mapping for a local path, in both its raw and
    /// normalized forms. Idempotent.
    pub fn remove_mapping(&self, local_path: &Path) -> StoreResult<()> {
        let mut doc = self.doc.lock();
        let raw = local_path.to_string_lossy().into_owned();
        let removed_raw = doc.sync_settings.file_mapping.remove(&raw).is_some();
        let removed_norm = doc
            .sync_settings
            .file_mapping
            .remove(&normalize_path(local_path))
            .is_some();
        if removed_raw || removed_norm {
            self.persist(&doc)
        } else {
            Ok(())
        }
    }

    /// Removes every mapping whose cloud path equals `cloud_path` or lies
    /// under it as a directory prefix. Returns how many were removed.
    pub fn remove_mappings_under(&self, cloud_path: &str) -> StoreResult<usize> {
        let prefix = format!("{cloud_path}/");
        let mut doc = self.doc.lock();
        let before = doc.sync_settings.file_mapping.len();
        doc.sync_settings
            .file_mapping
            .retain(|_, cloud| cloud != cloud_path && !cloud.starts_with(&prefix));
        let removed = before - doc.sync_settings.file_mapping.len();
        if removed > 0 {
            self.persist(&doc)?;
        }
        Ok(removed)
    }

    /// First local path mapped to the given cloud path, if any.
    ///
    /// Renames can leave one cloud path mapped from several local paths;
    /// the first match in key order wins.
    pub fn local_for_cloud(&self, cloud_path: &str) -> Option<PathBuf> {
        self.doc
            .lock()
            .sync_settings
            .file_mapping
            .iter()
            .find(|(_, cloud)| cloud.as_str() == cloud_path)
            .map(|(local, _)| PathBuf::from(local))
    }

    /// Snapshot of the whole mapping table.
    pub fn mappings(&self) -> BTreeMap<String, String> {
        self.doc.lock().sync_settings.file_mapping.clone()
    }
}

/// Normalizes a local path the way the mapping table stores keys:
/// OS-canonical separators, `.` segments dropped, `..` collapsed where
/// possible. Purely lexical; the filesystem is not consulted.
pub fn normalize_path(path: &Path) -> String {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_up = normalized
                    .components()
                    .next_back()
                    .is_some_and(|c| matches!(c, Component::ParentDir));
                if last_is_up {
                    normalized.push("..");
                } else if !normalized.pop() && normalized.as_os_str().is_empty() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized.to_string_lossy().into_owned()
}
