//! The persisted configuration document.
//!
//! One JSON file holds both the application settings and the sync
//! settings. Scalar sync settings are kept as raw JSON values so
//! documents written by older builds (string booleans, extra keys) load
//! unchanged; the file mapping is typed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Keys of the sync settings namespace.
pub mod keys {
    pub const SERVER_URL: &str = "server_url";
    pub const API_KEY: &str = "api_key";
    pub const ENABLED: &str = "enabled";
    pub const LAST_SYNC_TIME: &str = "last_sync_time";
}

/// Application-level settings. Only the notes root is consumed by the
/// sync engine; everything else belongs to the UI layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSettings {
    /// Root directory of the local notes tree.
    #[serde(default)]
    pub notes_dir: PathBuf,
}

/// The sync settings namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Local absolute path → cloud-relative path.
    #[serde(default)]
    pub file_mapping: BTreeMap<String, String>,
    /// Scalar settings: server_url, api_key, enabled, last_sync_time.
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

/// The whole persisted document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// UI/application settings.
    #[serde(default)]
    pub app_settings: AppSettings,
    /// Sync settings, including the file mapping.
    #[serde(default)]
    pub sync_settings: SyncSettings,
}

impl ConfigDocument {
    /// A fresh document with empty credentials, sync disabled, and the
    /// given notes root.
    pub fn with_notes_dir(notes_dir: impl Into<PathBuf>) -> Self {
        let mut values = Map::new();
        values.insert(keys::SERVER_URL.into(), Value::String(String::new()));
        values.insert(keys::API_KEY.into(), Value::String(String::new()));
        values.insert(keys::ENABLED.into(), Value::Bool(false));
        values.insert(keys::LAST_SYNC_TIME.into(), Value::from(0u64));
        Self {
            app_settings: AppSettings {
                notes_dir: notes_dir.into(),
            },
            sync_settings: SyncSettings {
                file_mapping: BTreeMap::new(),
                values,
            },
        }
    }
}

/// Interprets a stored flag that may be a bool or a legacy string form.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
