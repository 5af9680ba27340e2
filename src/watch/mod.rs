// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Registering every relevant directory under the root with a
//!   filesystem-notification backend (`notify` in production).
//! - Filtering noise (metadata changes, hidden/backup/vendored paths,
//!   non-source files).
//! - Coalescing bursts of events into deduplicated [`Batch`]es that are
//!   flushed on a fixed interval.
//!
//! It does **not** know about packages or tests; it only turns filesystem
//! changes into batches of changed source files.

pub mod backend;
pub mod batch;
pub mod event_handler;
pub mod rules;
pub mod walk;
pub mod watcher;

pub use backend::{
    BackendStreams, FsEvent, FsEventKind, Notifier, NotifierFactory, NotifyFactory,
};
pub use batch::{Batch, Operation};
pub use rules::SkipRules;
pub use watcher::{Watcher, WatcherOptions, WatcherState, DEFAULT_INTERVAL};
