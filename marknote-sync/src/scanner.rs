//! Local notes tree scanner.

use marknote_types::{LocalNote, mtime_epoch};
use std::path::Path;
use tracing::warn;

/// File extension that qualifies a file as a note.
const NOTE_EXTENSION: &str = "md";

/// Recursively collects every qualifying note under `root`.
///
/// Dotfiles and dot-directories are skipped; only `.md` files qualify.
/// An unreadable subdirectory is logged and skipped rather than failing
/// the whole scan. Results come back in path order.
pub fn scan_local_notes(root: &Path) -> Vec<LocalNote> {
    let mut notes = Vec::new();
    walk(root, &mut notes);
    notes.sort_by(|a, b| a.path.cmp(&b.path));
    notes
}

fn walk(dir: &Path, notes: &mut Vec<LocalNote>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to read directory {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            walk(&path, notes);
        } else if path.extension().is_some_and(|ext| ext == NOTE_EXTENSION) {
            let last_modified = entry.metadata().map(|m| mtime_epoch(&m)).unwrap_or(0);
            notes.push(LocalNote {
                path,
                last_modified,
            });
        }
    }
}
