// src/watch/watcher.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, RetestError};
use crate::fs::FileSystem;
use crate::watch::backend::{BackendStreams, FsEvent, Notifier, NotifierFactory};
use crate::watch::batch::Batch;
use crate::watch::event_handler::{handle_event, EventContext};
use crate::watch::rules::SkipRules;
use crate::watch::walk::register_tree;

/// Default debounce interval between flush checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Tunables for a [`Watcher`].
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Period of the flush timer.
    pub interval: Duration,
    pub rules: SkipRules,
}

/// Lifecycle of a [`Watcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Running,
    Stopped,
}

/// Recursive, debouncing directory watcher.
///
/// Raw events are classified into a [`Batch`]; every `interval` a non-empty
/// batch is handed to the consumer over a capacity-1 channel. The send waits
/// for room, so while the consumer is busy the watcher stops classifying new
/// events (they stay queued in the backend stream) and at most one batch sits
/// in the channel.
pub struct Watcher {
    root: PathBuf,
    options: WatcherOptions,
    fs: Arc<dyn FileSystem>,
    factory: Arc<dyn NotifierFactory>,
    stop: CancellationToken,
    state: WatcherState,
    tx: Option<mpsc::Sender<Batch>>,
    rx: Option<mpsc::Receiver<Batch>>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("root", &self.root)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Create an idle watcher for `root`.
    ///
    /// The watch loop stops when `cancel` (or the watcher's own stop signal)
    /// fires.
    pub fn new(
        root: impl Into<PathBuf>,
        options: WatcherOptions,
        fs: Arc<dyn FileSystem>,
        factory: Arc<dyn NotifierFactory>,
        cancel: &CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<Batch>(1);
        Self {
            root: root.into(),
            options,
            fs,
            factory,
            stop: cancel.child_token(),
            state: WatcherState::Idle,
            tx: Some(tx),
            rx: Some(rx),
            task: None,
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Take the receiving end of the batch channel.
    ///
    /// Only the first call returns `Some`; there is a single consumer.
    pub fn take_channel(&mut self) -> Option<mpsc::Receiver<Batch>> {
        self.rx.take()
    }

    /// Initialise the backend, register the directory tree and spawn the
    /// watch loop. Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.state != WatcherState::Idle {
            return Err(RetestError::InvalidState(format!(
                "cannot start watcher in state {:?}",
                self.state
            )));
        }

        let (mut notifier, streams) =
            self.factory
                .create()
                .map_err(|err| RetestError::WatcherStart {
                    context: "failed to initialize notifier".to_string(),
                    source: err.into(),
                })?;

        let registered = register_tree(
            self.fs.as_ref(),
            notifier.as_mut(),
            &self.options.rules,
            &self.root,
            &self.root,
        )
        .map_err(|err| RetestError::WatcherStart {
            context: "failed to traverse sub directories".to_string(),
            source: err.into(),
        })?;

        let Some(tx) = self.tx.take() else {
            return Err(RetestError::InvalidState(
                "watcher output channel already consumed".to_string(),
            ));
        };

        info!(root = ?self.root, directories = registered, "file watcher started");

        let watch_loop = WatchLoop {
            root: self.root.clone(),
            rules: self.options.rules.clone(),
            fs: Arc::clone(&self.fs),
            notifier,
            streams,
            tx,
            cancel: self.stop.clone(),
            batch: Batch::new(),
        };

        let interval = self.options.interval;
        self.task = Some(tokio::spawn(watch_loop.run(interval)));
        self.state = WatcherState::Running;

        Ok(())
    }

    /// Stop the watch loop and wait for it to exit.
    ///
    /// The loop owns the backend, the timer and the sending half of the
    /// channel; once it has exited all three are gone and the consumer sees
    /// end-of-stream.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != WatcherState::Running {
            return Err(RetestError::InvalidState(format!(
                "cannot stop watcher in state {:?}",
                self.state
            )));
        }

        self.stop.cancel();

        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "watch loop terminated abnormally");
            }
        }

        self.state = WatcherState::Stopped;
        info!(root = ?self.root, "file watcher stopped");
        Ok(())
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

/// State owned exclusively by the spawned watch loop.
struct WatchLoop {
    root: PathBuf,
    rules: SkipRules,
    fs: Arc<dyn FileSystem>,
    notifier: Box<dyn Notifier>,
    streams: BackendStreams,
    tx: mpsc::Sender<Batch>,
    cancel: CancellationToken,
    batch: Batch,
}

impl WatchLoop {
    async fn run(mut self, interval: Duration) {
        info!(
            directories = self.notifier.watch_count(),
            "watching for changes"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut errors_open = true;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("watch loop cancelled");
                    break;
                }

                maybe_err = self.streams.errors.recv(), if errors_open => {
                    match maybe_err {
                        Some(err) => error!(error = %err, "notifier error"),
                        None => errors_open = false,
                    }
                }

                maybe_event = self.streams.events.recv() => {
                    match maybe_event {
                        Some(event) => self.process(&event),
                        None => {
                            debug!("notifier event stream closed");
                            break;
                        }
                    }
                }

                _ = ticker.tick() => {
                    if !self.flush().await {
                        break;
                    }
                }
            }
        }

        debug!("watch loop finished");
    }

    fn process(&mut self, event: &FsEvent) {
        let mut ctx = EventContext {
            root: &self.root,
            rules: &self.rules,
            fs: self.fs.as_ref(),
            notifier: self.notifier.as_mut(),
        };

        if let Err(err) = handle_event(&mut ctx, &mut self.batch, event) {
            error!(
                error = ?err,
                event = ?event.kind,
                file = ?event.path,
                "error handling event"
            );
        }
    }

    /// Hand the current batch to the consumer. Returns `false` when the loop
    /// should exit.
    async fn flush(&mut self) -> bool {
        if self.batch.is_empty() {
            return true;
        }

        let batch = std::mem::take(&mut self.batch);
        info!(events = batch.len(), "publishing events");

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                debug!("watch loop cancelled while publishing");
                false
            }

            res = self.tx.send(batch) => match res {
                Ok(()) => true,
                Err(_) => {
                    debug!("batch receiver dropped; stopping watch loop");
                    false
                }
            },
        }
    }
}
