// src/watch/event_handler.rs

//! Event filtering and classification.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::fs::{EntryKind, FileSystem};
use crate::watch::backend::{FsEvent, FsEventKind, Notifier};
use crate::watch::batch::{Batch, Operation};
use crate::watch::rules::SkipRules;
use crate::watch::walk::register_tree;

/// Everything the classifier needs besides the batch itself.
pub struct EventContext<'a> {
    pub root: &'a Path,
    pub rules: &'a SkipRules,
    pub fs: &'a dyn FileSystem,
    pub notifier: &'a mut dyn Notifier,
}

/// Fold a single raw event into `batch`.
///
/// 1. Metadata-only events and events on pruned paths are dropped.
/// 2. Writes and removals of source files are recorded.
/// 3. Creations register new directories (recursively) and record new
///    source files.
///
/// Errors only come from registering a new directory or from a stat that
/// failed for a reason other than the path being gone.
pub fn handle_event(ctx: &mut EventContext<'_>, batch: &mut Batch, event: &FsEvent) -> Result<()> {
    debug!(path = ?event.path, kind = ?event.kind, "new event received");

    if should_skip_event(ctx, event) {
        debug!(path = ?event.path, kind = ?event.kind, "skipping event");
        return Ok(());
    }

    match event.kind {
        FsEventKind::Write => {
            if ctx.rules.is_source_file(&event.path) {
                debug!(file = ?event.path, "file written, adding to batch");
                batch.add(&event.path, Operation::Write);
            }
        }
        FsEventKind::Create => handle_create(ctx, batch, &event.path)?,
        FsEventKind::Remove => {
            if ctx.rules.is_source_file(&event.path) {
                debug!(file = ?event.path, "file deleted, adding to batch");
                batch.add(&event.path, Operation::Delete);
            }
        }
        FsEventKind::Rename | FsEventKind::Chmod | FsEventKind::Other => {
            debug!(path = ?event.path, kind = ?event.kind, "event not handled");
        }
    }

    Ok(())
}

fn should_skip_event(ctx: &EventContext<'_>, event: &FsEvent) -> bool {
    event.kind == FsEventKind::Chmod || ctx.rules.should_skip_path(ctx.root, &event.path)
}

fn handle_create(ctx: &mut EventContext<'_>, batch: &mut Batch, path: &Path) -> Result<()> {
    let kind = match ctx.fs.entry_kind(path) {
        Ok(kind) => kind,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(file = ?path, "ignore event, file or directory does not exist");
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| {
                format!("failed to fetch information for {:?}", path)
            });
        }
    };

    if kind == EntryKind::Symlink {
        debug!(path = ?path, "symlink created, not following");
    } else if kind == EntryKind::Dir {
        let count = register_tree(ctx.fs, &mut *ctx.notifier, ctx.rules, ctx.root, path)
            .context("failed to walk new directory")?;
        debug!(directory = ?path, registered = count, "new directory registered");
    }

    if ctx.rules.is_source_file(path) {
        debug!(file = ?path, "file created, adding to batch");
        batch.add(path, Operation::Create);
    }

    Ok(())
}
