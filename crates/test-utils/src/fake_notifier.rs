use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use retest::watch::{BackendStreams, FsEvent, FsEventKind, Notifier, NotifierFactory};

#[derive(Default)]
struct FakeState {
    watched: Vec<PathBuf>,
    event_tx: Option<mpsc::UnboundedSender<FsEvent>>,
    error_tx: Option<mpsc::UnboundedSender<notify::Error>>,
    fail_create: bool,
    fail_watch: HashSet<PathBuf>,
}

/// Notification backend driven by the test.
///
/// Events are injected with [`FakeNotifierFactory::send`]; registrations are
/// recorded and can be inspected with [`FakeNotifierFactory::watched`].
/// Clones share state.
#[derive(Clone, Default)]
pub struct FakeNotifierFactory {
    state: Arc<Mutex<FakeState>>,
}

impl FakeNotifierFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory whose backend fails to initialise.
    pub fn failing() -> Self {
        let factory = Self::default();
        factory.state.lock().unwrap().fail_create = true;
        factory
    }

    /// Make registration of `dir` fail.
    pub fn fail_watch(&self, dir: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .fail_watch
            .insert(dir.as_ref().to_path_buf());
    }

    /// Directories registered so far, in registration order.
    pub fn watched(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().watched.clone()
    }

    /// Deliver a raw event. Returns `false` if no backend is live.
    pub fn send(&self, path: impl Into<PathBuf>, kind: FsEventKind) -> bool {
        let state = self.state.lock().unwrap();
        match &state.event_tx {
            Some(tx) => tx.send(FsEvent::new(path, kind)).is_ok(),
            None => false,
        }
    }

    /// Deliver a backend error. Returns `false` if no backend is live.
    pub fn send_error(&self, message: &str) -> bool {
        let state = self.state.lock().unwrap();
        match &state.error_tx {
            Some(tx) => tx.send(notify::Error::generic(message)).is_ok(),
            None => false,
        }
    }

    /// Drop the sending halves, ending the event and error streams.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.event_tx = None;
        state.error_tx = None;
    }
}

impl NotifierFactory for FakeNotifierFactory {
    fn create(&self) -> Result<(Box<dyn Notifier>, BackendStreams)> {
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(anyhow!("too many open files"));
        }

        let (event_tx, events) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();
        state.event_tx = Some(event_tx);
        state.error_tx = Some(error_tx);

        let notifier = FakeNotifier {
            state: Arc::clone(&self.state),
        };
        Ok((Box::new(notifier), BackendStreams { events, errors }))
    }
}

struct FakeNotifier {
    state: Arc<Mutex<FakeState>>,
}

impl Notifier for FakeNotifier {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_watch.contains(dir) {
            return Err(anyhow!("failed to add path {:?} to notifier", dir));
        }
        state.watched.push(dir.to_path_buf());
        Ok(())
    }

    fn watch_count(&self) -> usize {
        self.state.lock().unwrap().watched.len()
    }
}
