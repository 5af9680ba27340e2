// src/watch/walk.rs

//! Recursive directory registration.
//!
//! Used both when the watcher starts (for the whole root) and whenever a new
//! directory shows up, so the pruning rules are identical at both sites.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::backend::Notifier;
use crate::watch::rules::SkipRules;

/// Register `dir` and every non-pruned directory below it with `notifier`.
///
/// Pruned directories are not descended into, and neither are symlinks,
/// so a link back to an ancestor cannot make the walk loop. Returns the number of
/// directories registered. Filesystem and backend errors are propagated
/// as-is.
pub fn register_tree(
    fs: &dyn FileSystem,
    notifier: &mut dyn Notifier,
    rules: &SkipRules,
    root: &Path,
    dir: &Path,
) -> Result<usize> {
    let mut registered = 0;
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        if rules.should_skip_path(root, &current) {
            debug!(directory = ?current, "ignoring skip-able directory");
            continue;
        }

        notifier.watch(&current)?;
        registered += 1;
        debug!(directory = ?current, "directory added to notifier");

        for child in fs.read_dir(&current)? {
            if fs.is_dir(&child) {
                stack.push(child);
            }
        }
    }

    Ok(registered)
}
