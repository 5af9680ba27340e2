// src/runner/model.rs

//! Data model of a single test run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::Result;
use crate::fs::FileSystem;

/// File name of the coverage profile inside a run's scratch directory.
pub const COVERPROFILE_FILE: &str = "coverprofile.out";

/// `Action` field of a `go test -json` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Run,
    Pause,
    Cont,
    Pass,
    Bench,
    Fail,
    Output,
    Skip,
    #[serde(other)]
    #[default]
    Unknown,
}

/// One line of structured test output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestEvent {
    #[serde(rename = "Time", default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "Action", default)]
    pub action: Action,
    #[serde(rename = "Package", default)]
    pub package: String,
    #[serde(rename = "Test", default)]
    pub test: Option<String>,
    #[serde(rename = "Output", default)]
    pub output: Option<String>,
    #[serde(rename = "Elapsed", default)]
    pub elapsed: Option<f64>,
}

impl TestEvent {
    /// Test name, if this event is scoped to a test.
    pub fn test_name(&self) -> Option<&str> {
        self.test.as_deref().filter(|t| !t.is_empty())
    }
}

/// A test seen during the run. Only the first event for it is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub name: String,
    pub first_event: TestEvent,
}

/// Aggregated state of one package.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Package {
    pub name: String,
    pub pass: bool,
    /// Number of tests within the package that passed.
    pub passed: usize,
    /// Number of tests within the package that failed.
    pub failed: usize,
    /// Number of tests within the package that were skipped.
    pub skipped: usize,
    pub tests: HashMap<String, Test>,
    pub coverage: f64,
    pub elapsed: f64,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Handle to a run-scoped scratch directory.
///
/// The directory is deleted by an explicit [`ScratchDir::close`]; closing
/// twice is a no-op. Dropping the handle does not delete anything.
pub struct ScratchDir {
    path: Option<PathBuf>,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for ScratchDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchDir")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ScratchDir {
    pub fn new(path: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: Some(path),
            fs,
        }
    }

    /// Location of the directory, or `None` once closed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Delete the directory.
    ///
    /// The handle counts as released even when deletion fails, so the
    /// removal is attempted at most once.
    pub fn close(&mut self) -> Result<()> {
        let Some(path) = self.path.take() else {
            return Ok(());
        };
        debug!(dir = ?path, "removing scratch directory");
        self.fs.remove_dir_all(&path)?;
        Ok(())
    }
}

/// Outcome of one `Runner::run`.
#[derive(Debug)]
pub struct RunResult {
    pub id: Uuid,
    /// Overall pass flag. Starts `true` and is not derived from the
    /// packages; see [`RunResult::all_packages_passed`].
    pub pass: bool,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: Duration,
    pub exit_code: i32,
    pub packages: HashMap<String, Package>,
    pub(crate) scratch: ScratchDir,
}

impl RunResult {
    /// Fresh result owning `scratch`, stamped with the current time.
    pub fn new(id: Uuid, scratch: ScratchDir) -> Self {
        let now = Utc::now();
        Self {
            id,
            pass: true,
            start: now,
            end: now,
            duration: Duration::ZERO,
            exit_code: 0,
            packages: HashMap::new(),
            scratch,
        }
    }

    /// Whether every package in the run is marked as passing.
    pub fn all_packages_passed(&self) -> bool {
        self.packages.values().all(|p| p.pass)
    }

    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.path()
    }

    /// Where the test tool was asked to write its coverage profile.
    pub fn coverprofile_path(&self) -> Option<PathBuf> {
        self.scratch.path().map(|dir| dir.join(COVERPROFILE_FILE))
    }

    /// Release the scratch directory. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        self.scratch.close()
    }
}
