//! Core type definitions for Marknote.
//!
//! This crate defines the fundamental types shared between the
//! configuration store and the sync engine:
//! - Local and remote note records
//! - Epoch-second timestamp helpers
//!
//! UI-facing types (editor buffers, tree models, dialog state) belong to
//! the application layer, not here.

mod note;
mod timestamp;

pub use note::{LocalNote, RemoteNote, synthesize_dir_records};
pub use timestamp::{mtime_epoch, unix_now};
