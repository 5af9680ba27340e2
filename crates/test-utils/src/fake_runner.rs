use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use retest::errors::RetestError;
use retest::fs::mock::MockFileSystem;
use retest::fs::FileSystem;
use retest::runner::{Package, RunResult, RunnerFuture, ScratchDir, TestRunner};

#[derive(Default)]
struct RunnerState {
    /// file -> package; files not present fail resolution.
    packages: HashMap<PathBuf, String>,
    lookups: Vec<PathBuf>,
    runs: Vec<Vec<String>>,
    fail_runs: bool,
}

/// A fake [`TestRunner`] that:
/// - resolves files from a fixed table
/// - records every run request
/// - hands back results whose scratch dirs live on a [`MockFileSystem`].
///
/// Clones share state.
#[derive(Clone)]
pub struct FakeTestRunner {
    state: Arc<Mutex<RunnerState>>,
    fs: MockFileSystem,
}

impl Default for FakeTestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTestRunner {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RunnerState::default())),
            fs: MockFileSystem::new(),
        }
    }

    /// Map `file` to `package`.
    pub fn with_package(self, file: impl Into<PathBuf>, package: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .packages
            .insert(file.into(), package.to_string());
        self
    }

    /// Make every run fail as if the test tool could not be launched.
    pub fn failing_runs(self) -> Self {
        self.state.lock().unwrap().fail_runs = true;
        self
    }

    pub fn lookups(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().lookups.clone()
    }

    /// Package lists passed to `run`, in call order.
    pub fn runs(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().runs.clone()
    }

    /// Filesystem backing the scratch dirs of returned results.
    pub fn fs(&self) -> &MockFileSystem {
        &self.fs
    }
}

impl TestRunner for FakeTestRunner {
    fn run<'a>(&'a self, packages: &'a [String]) -> RunnerFuture<'a, RunResult> {
        Box::pin(async move {
            let fail = {
                let mut state = self.state.lock().unwrap();
                state.runs.push(packages.to_vec());
                state.fail_runs
            };
            if fail {
                return Err(RetestError::Launch {
                    program: "go".to_string(),
                    dir: PathBuf::from("."),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                });
            }

            let id = Uuid::new_v4();
            let dir = PathBuf::from("/scratch").join(id.to_string());
            self.fs.create_dir_all(&dir)?;
            let fs: Arc<dyn FileSystem> = Arc::new(self.fs.clone());

            let mut result = RunResult::new(id, ScratchDir::new(dir, fs));
            for name in packages {
                let mut package = Package::new(name.clone());
                package.pass = true;
                package.passed = 1;
                result.packages.insert(name.clone(), package);
            }
            Ok(result)
        })
    }

    fn find_package<'a>(&'a self, file: &'a Path) -> RunnerFuture<'a, String> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.lookups.push(file.to_path_buf());
            match state.packages.get(file) {
                Some(package) => Ok(package.clone()),
                None => Err(RetestError::PackageResolution {
                    path: file.to_path_buf(),
                    exit_code: 1,
                    output: "no Go files".to_string(),
                }),
            }
        })
    }
}
