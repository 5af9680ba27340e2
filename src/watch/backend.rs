// src/watch/backend.rs

//! Pluggable filesystem-notification backend.
//!
//! The watcher only needs to register directories and receive events and
//! errors on two separate streams. Production code uses [`NotifyFactory`],
//! which wraps `notify::RecommendedWatcher` and bridges its callback into
//! Tokio channels. Tests provide their own factory that lets them inject
//! events directly.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Classified kind of a raw filesystem event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Create,
    Write,
    Remove,
    Rename,
    /// Pure metadata/permission change.
    Chmod,
    Other,
}

/// A single-path filesystem event as seen by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Split a `notify` event into one `FsEvent` per path.
    pub fn from_notify(event: Event) -> Vec<FsEvent> {
        match event.kind {
            // Both ends of a rename in one event: old path goes away, new one appears.
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut out = Vec::with_capacity(event.paths.len());
                let mut paths = event.paths.into_iter();
                if let Some(from) = paths.next() {
                    out.push(FsEvent::new(from, FsEventKind::Rename));
                }
                out.extend(paths.map(|to| FsEvent::new(to, FsEventKind::Create)));
                out
            }
            kind => {
                let kind = classify_kind(kind);
                event
                    .paths
                    .into_iter()
                    .map(|path| FsEvent::new(path, kind))
                    .collect()
            }
        }
    }
}

fn classify_kind(kind: EventKind) -> FsEventKind {
    match kind {
        EventKind::Create(_) => FsEventKind::Create,
        EventKind::Remove(_) => FsEventKind::Remove,
        EventKind::Modify(ModifyKind::Metadata(_)) => FsEventKind::Chmod,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => FsEventKind::Create,
        EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Rename,
        EventKind::Modify(_) => FsEventKind::Write,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => FsEventKind::Other,
    }
}

/// Receiving ends of a backend: events and backend errors are delivered
/// separately.
#[derive(Debug)]
pub struct BackendStreams {
    pub events: mpsc::UnboundedReceiver<FsEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// A live notification backend that directories can be registered with.
///
/// Dropping it closes the backend.
pub trait Notifier: Send {
    /// Register a single directory (non-recursively).
    fn watch(&mut self, dir: &Path) -> Result<()>;

    /// Number of registered directories.
    fn watch_count(&self) -> usize;
}

/// Creates notifiers. Called once per `Watcher::start`.
pub trait NotifierFactory: Send + Sync {
    fn create(&self) -> Result<(Box<dyn Notifier>, BackendStreams)>;
}

/// Factory for the platform's recommended `notify` watcher.
#[derive(Debug, Clone, Default)]
pub struct NotifyFactory;

impl NotifierFactory for NotifyFactory {
    fn create(&self) -> Result<(Box<dyn Notifier>, BackendStreams)> {
        // Channels from the blocking notify callback into the async world.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<FsEvent>();
        let (error_tx, error_rx) = mpsc::unbounded_channel::<notify::Error>();

        // Closure called synchronously by notify whenever an event arrives.
        // Send failures only mean the watcher loop is gone.
        let inner = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for ev in FsEvent::from_notify(event) {
                        let _ = event_tx.send(ev);
                    }
                }
                Err(err) => {
                    let _ = error_tx.send(err);
                }
            },
            Config::default(),
        )
        .context("initializing notify watcher")?;

        let notifier = NotifyNotifier {
            inner,
            watched: HashSet::new(),
        };

        Ok((
            Box::new(notifier),
            BackendStreams {
                events: event_rx,
                errors: error_rx,
            },
        ))
    }
}

/// `notify`-backed [`Notifier`].
pub struct NotifyNotifier {
    inner: RecommendedWatcher,
    watched: HashSet<PathBuf>,
}

impl std::fmt::Debug for NotifyNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyNotifier")
            .field("watched", &self.watched.len())
            .finish_non_exhaustive()
    }
}

impl Notifier for NotifyNotifier {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.inner
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to add path {:?} to notifier", dir))?;
        self.watched.insert(dir.to_path_buf());
        Ok(())
    }

    fn watch_count(&self) -> usize {
        self.watched.len()
    }
}
