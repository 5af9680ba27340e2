// src/runner/runner.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{Result, RetestError};
use crate::exec::Executor;
use crate::fs::FileSystem;
use crate::runner::model::{RunResult, ScratchDir, COVERPROFILE_FILE};
use crate::runner::parser::parse_output;
use crate::runner::scratch::ScratchRoot;

/// Default test tool.
pub const DEFAULT_BIN: &str = "go";

/// Future returned by [`TestRunner`] methods.
pub type RunnerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// What the engine needs from a test runner.
///
/// Production code uses [`Runner`]; tests substitute a fake.
pub trait TestRunner: Send + Sync {
    /// Run the tests of `packages` and return the populated result.
    fn run<'a>(&'a self, packages: &'a [String]) -> RunnerFuture<'a, RunResult>;

    /// Resolve a changed file to the package that owns it.
    fn find_package<'a>(&'a self, file: &'a Path) -> RunnerFuture<'a, String>;
}

/// Runner settings.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Test tool binary, `go` by default.
    pub bin: String,
    /// Parent of the per-run scratch directories; a fresh temp directory
    /// when `None`.
    pub scratch_root: Option<PathBuf>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            bin: DEFAULT_BIN.to_string(),
            scratch_root: None,
        }
    }
}

/// Runs the test tool for a set of packages and folds its JSON output into a
/// [`RunResult`].
///
/// At most one run is expected to be in flight; the caller owns the returned
/// result and must close it to delete the run's scratch directory.
pub struct Runner<E: Executor> {
    root_dir: PathBuf,
    bin: String,
    executor: E,
    scratch: ScratchRoot,
}

impl<E: Executor> std::fmt::Debug for Runner<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("root_dir", &self.root_dir)
            .field("bin", &self.bin)
            .field("scratch", &self.scratch)
            .finish_non_exhaustive()
    }
}

impl<E: Executor> Runner<E> {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        options: RunnerOptions,
        executor: E,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            bin: options.bin,
            executor,
            scratch: ScratchRoot::new(options.scratch_root, fs),
        }
    }

    pub fn scratch_root(&self) -> &ScratchRoot {
        &self.scratch
    }

    /// Run the tests of `packages`.
    ///
    /// A failing test suite (non-zero exit) still yields `Ok`; only a command
    /// that could not run, or output that could not be folded, is an error.
    /// In the error case the run's scratch directory is removed before
    /// returning.
    pub async fn run(&self, packages: &[String]) -> Result<RunResult> {
        let id = Uuid::new_v4();
        let mut scratch = self.scratch.create_run_dir(id).await?;

        let coverprofile = match scratch.path() {
            Some(dir) => dir.join(COVERPROFILE_FILE),
            None => {
                return Err(RetestError::InvalidState(
                    "scratch directory closed before use".to_string(),
                ));
            }
        };
        let args = test_args(&coverprofile, packages);

        info!(run_id = %id, bin = %self.bin, ?args, "executing test command");

        let start = Utc::now();
        let started = Instant::now();
        let executed = self
            .executor
            .execute(&self.root_dir, &self.bin, &args)
            .await;
        let duration = started.elapsed();

        let output = match executed {
            Ok(output) => output,
            Err(err) => {
                discard_scratch(&mut scratch);
                return Err(err);
            }
        };

        info!(
            run_id = %id,
            duration = ?duration,
            exit_code = output.exit_code,
            "finished executing test run"
        );

        let packages = match parse_output(&output.output) {
            Ok(packages) => packages,
            Err(err) => {
                discard_scratch(&mut scratch);
                return Err(err);
            }
        };

        let mut result = RunResult::new(id, scratch);
        result.start = start;
        result.end = Utc::now();
        result.duration = duration;
        result.exit_code = output.exit_code;
        result.packages = packages;

        Ok(result)
    }

    /// Resolve `file` to the import path of the package in its directory.
    pub async fn find_package(&self, file: &Path) -> Result<String> {
        let dir = file.parent().unwrap_or(file);
        let args = find_package_args(dir);

        debug!(?args, "executing package lookup");

        let output = self
            .executor
            .execute(&self.root_dir, &self.bin, &args)
            .await?;

        let text = String::from_utf8_lossy(&output.output).trim().to_string();
        if !output.success() || text.is_empty() {
            return Err(RetestError::PackageResolution {
                path: file.to_path_buf(),
                exit_code: output.exit_code,
                output: text,
            });
        }

        Ok(text)
    }
}

impl<E: Executor> TestRunner for Runner<E> {
    fn run<'a>(&'a self, packages: &'a [String]) -> RunnerFuture<'a, RunResult> {
        Box::pin(Runner::run(self, packages))
    }

    fn find_package<'a>(&'a self, file: &'a Path) -> RunnerFuture<'a, String> {
        Box::pin(Runner::find_package(self, file))
    }
}

/// Arguments for `<bin> test`: JSON events, coverage into `coverprofile`,
/// then the packages.
pub fn test_args(coverprofile: &Path, packages: &[String]) -> Vec<String> {
    let mut args = vec![
        "test".to_string(),
        "-json".to_string(),
        "-cover".to_string(),
        "-coverprofile".to_string(),
        coverprofile.to_string_lossy().into_owned(),
    ];
    args.extend(packages.iter().cloned());
    args
}

/// Arguments for `<bin> list` resolving the package in `dir`.
pub fn find_package_args(dir: &Path) -> Vec<String> {
    vec![
        "list".to_string(),
        "-find".to_string(),
        "-f".to_string(),
        "{{.ImportPath}}".to_string(),
        dir.to_string_lossy().into_owned(),
    ]
}

fn discard_scratch(scratch: &mut ScratchDir) {
    if let Err(err) = scratch.close() {
        warn!(error = %err, "failed to delete scratch directory of failed run");
    }
}
