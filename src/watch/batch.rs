// src/watch/batch.rs

//! The unit of work handed from the watcher to its consumer.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to a file, as recorded in a [`Batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Delete,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "CREATE",
            Operation::Delete => "DELETE",
            Operation::Write => "WRITE",
        };
        f.write_str(s)
    }
}

/// Deduplicated set of changed paths accumulated between two flushes.
///
/// The first operation recorded for a path wins; later ones for the same
/// path are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    events: HashMap<PathBuf, Operation>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `op` for `path` unless the path is already present.
    pub fn add(&mut self, path: impl Into<PathBuf>, op: Operation) {
        if let Entry::Vacant(slot) = self.events.entry(path.into()) {
            slot.insert(op);
        }
    }

    /// All recorded paths, in no particular order.
    pub fn paths(&self) -> Vec<&Path> {
        self.events.keys().map(PathBuf::as_path).collect()
    }

    pub fn operation(&self, path: &Path) -> Option<Operation> {
        self.events.get(path).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, Operation)> {
        self.events.iter().map(|(p, op)| (p.as_path(), *op))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
