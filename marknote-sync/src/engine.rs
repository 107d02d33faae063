//! The reconciliation engine.
//!
//! Drives one sync pass: pre-flight connectivity check, local scan,
//! manifest exchange, plan application. Progress is delivered over a
//! one-way event channel so the pass can run on a background task while
//! the UI stays responsive.
//!
//! Only one pass may be in flight per engine. Per-item failures during
//! the apply phase are logged and counted, never fatal; the pass aborts
//! only on pre-flight or manifest-negotiation failure.

use crate::error::{SyncError, SyncResult};
use crate::ops::{NoteOps, read_note, write_note};
use crate::protocol::{ManifestEntry, ManifestRequest, SYNC_PATH, SyncPlan};
use crate::scanner::scan_local_notes;
use crate::transport::{ApiTransport, Method, Transport};
use marknote_store::ConfigStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Cooperative cancellation flag, checked between steps of a pass.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the pass holding this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Progress notifications emitted during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A pass has begun.
    Started,
    /// A human-readable progress message.
    Progress(String),
    /// The pass finished, successfully or not.
    Finished {
        success: bool,
        message: String,
    },
}

/// Phases of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Testing,
    Scanning,
    Negotiating,
    Applying,
    Done,
    Failed,
}

/// Counts of work performed by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Downloads attempted during the apply phase.
    pub downloaded: usize,
    /// Uploads attempted during the apply phase.
    pub uploaded: usize,
    /// Plan entries the server asked to delete. Surfaced only — the
    /// engine never deletes local or remote files during a pass; see
    /// the open product question in DESIGN.md.
    pub deletions_reported: usize,
}

impl SyncSummary {
    fn message(&self) -> String {
        format!(
            "sync finished: {} downloaded, {} uploaded, {} deletions reported",
            self.downloaded, self.uploaded, self.deletions_reported
        )
    }
}

/// The reconciliation engine.
pub struct SyncEngine {
    store: Arc<ConfigStore>,
    transport: Arc<dyn Transport>,
    ops: NoteOps,
    in_flight: AtomicBool,
    cancel: CancelToken,
    phase: Mutex<SyncPhase>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<SyncEvent>>>,
}

impl SyncEngine {
    /// Creates an engine over an explicit store and transport.
    pub fn new(store: Arc<ConfigStore>, transport: Arc<dyn Transport>) -> Self {
        let ops = NoteOps::new(store.clone(), transport.clone());
        Self {
            store,
            transport,
            ops,
            in_flight: AtomicBool::new(false),
            cancel: CancelToken::new(),
            phase: Mutex::new(SyncPhase::Idle),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Builds an engine talking to the configured server over HTTP.
    ///
    /// The transport is bound to the settings at construction time;
    /// rebuild the engine after changing the server URL or API key.
    pub fn from_store(store: Arc<ConfigStore>) -> Self {
        let transport = Arc::new(ApiTransport::new(store.server_url(), store.api_key()));
        Self::new(store, transport)
    }

    /// Single-note operations for ad-hoc UI calls.
    pub fn ops(&self) -> &NoteOps {
        &self.ops
    }

    /// Whether sync is enabled (flag set and API key present).
    pub fn is_sync_enabled(&self) -> bool {
        self.store.is_sync_enabled()
    }

    /// Checks connectivity to the configured server.
    pub async fn test_connection(&self) -> SyncResult<()> {
        self.transport.test_connection().await
    }

    /// The cancellation token for the current (or next) pass.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The phase the engine is currently in.
    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock()
    }

    /// Subscribes to progress events. Each subscriber gets every event
    /// emitted after the call; closed receivers are dropped silently.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    fn emit(&self, event: SyncEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn set_phase(&self, phase: SyncPhase) {
        *self.phase.lock() = phase;
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs one reconciliation pass to completion on the current task.
    ///
    /// A second call while a pass is active returns
    /// [`SyncError::AlreadyRunning`] instead of interleaving mapping
    /// writes from two passes.
    pub async fn sync_notes(&self) -> SyncResult<SyncSummary> {
        if !self.store.is_sync_enabled() {
            return Err(SyncError::Disabled);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SyncError::AlreadyRunning);
        }
        self.cancel.reset();

        self.emit(SyncEvent::Started);
        self.emit(SyncEvent::Progress("starting sync".into()));

        let result = self.run_pass().await;
        self.in_flight.store(false, Ordering::SeqCst);

        match &result {
            Ok(summary) => {
                self.set_phase(SyncPhase::Done);
                self.emit(SyncEvent::Finished {
                    success: true,
                    message: summary.message(),
                });
            }
            Err(e) => {
                self.set_phase(SyncPhase::Failed);
                self.emit(SyncEvent::Finished {
                    success: false,
                    message: e.to_string(),
                });
            }
        }
        result
    }

    /// Runs a pass on a background task so callers (e.g. a UI event
    /// loop) are never blocked. Progress arrives through
    /// [`SyncEngine::subscribe`].
    pub fn spawn_sync(self: &Arc<Self>) -> tokio::task::JoinHandle<SyncResult<SyncSummary>> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.sync_notes().await })
    }

    async fn run_pass(&self) -> SyncResult<SyncSummary> {
        self.set_phase(SyncPhase::Testing);
        self.emit(SyncEvent::Progress("checking server connectivity".into()));
        if let Err(e) = self.transport.test_connection().await {
            warn!("pre-flight connection check failed: {e}");
            return Err(e);
        }
        self.check_cancelled()?;

        self.set_phase(SyncPhase::Scanning);
        self.emit(SyncEvent::Progress("scanning local notes".into()));
        let root = self.store.notes_dir();
        let local_notes = scan_local_notes(&root);
        info!(count = local_notes.len(), "local scan complete");
        self.check_cancelled()?;

        self.set_phase(SyncPhase::Negotiating);
        self.emit(SyncEvent::Progress("negotiating with server".into()));
        let mut manifest = ManifestRequest::default();
        for note in &local_notes {
            manifest.notes.push(ManifestEntry {
                path: self.ops.resolve_cloud_path(&note.path),
                last_modified: note.last_modified,
            });
        }
        let body = serde_json::to_value(&manifest)?;
        let value = self
            .transport
            .request_json(Method::Post, SYNC_PATH, Some(body), &[])
            .await?;
        let plan: SyncPlan = serde_json::from_value(value)
            .map_err(|e| SyncError::Protocol(format!("unexpected sync plan shape: {e}")))?;
        self.check_cancelled()?;

        self.set_phase(SyncPhase::Applying);
        let mut summary = SyncSummary {
            deletions_reported: plan.to_delete.len(),
            ..Default::default()
        };

        self.emit(SyncEvent::Progress(format!(
            "{} notes to download",
            plan.to_download.len()
        )));
        for entry in &plan.to_download {
            self.check_cancelled()?;
            summary.downloaded += 1;
            match self.ops.download_note(&entry.path, None).await {
                Ok(content) => {
                    let local_path = self.ops.resolve_local_path(&entry.path);
                    if let Err(e) = write_note(&local_path, &content) {
                        warn!("failed to write downloaded note {}: {e}", entry.path);
                    }
                }
                Err(e) => warn!("failed to download {}: {e}", entry.path),
            }
        }

        self.emit(SyncEvent::Progress(format!(
            "{} notes to upload",
            plan.to_upload.len()
        )));
        for entry in &plan.to_upload {
            self.check_cancelled()?;
            let local_path = self.ops.resolve_local_path(&entry.path);
            if !local_path.exists() {
                continue;
            }
            let content = match read_note(&local_path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("failed to read {}: {e}", local_path.display());
                    continue;
                }
            };
            summary.uploaded += 1;
            if let Err(e) = self.ops.upload_note(&local_path, Some(&content)).await {
                warn!("failed to upload {}: {e}", local_path.display());
            }
        }

        // The server also names entries to delete. Whether a pass should
        // act on them (locally or remotely) is an open product question,
        // so they are only surfaced in the summary.
        if !plan.to_delete.is_empty() {
            self.emit(SyncEvent::Progress(format!(
                "{} deletions reported by server (not applied)",
                plan.to_delete.len()
            )));
        }

        if let Err(e) = self.store.touch_last_sync_time() {
            warn!("failed to persist last sync time: {e}");
        }
        Ok(summary)
    }
}
