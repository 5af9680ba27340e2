// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::runner::{RunResult, TestRunner};
use crate::watch::Batch;

/// Consumes batches from the watcher and re-runs the affected packages.
///
/// Runs are strictly sequential: the next batch is only received once the
/// current run has finished and its result was disposed of.
pub struct Runtime<R: TestRunner> {
    batches: mpsc::Receiver<Batch>,
    runner: R,
    cancel: CancellationToken,
}

impl<R: TestRunner> fmt::Debug for Runtime<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<R: TestRunner> Runtime<R> {
    pub fn new(batches: mpsc::Receiver<Batch>, runner: R, cancel: CancellationToken) -> Self {
        Self {
            batches,
            runner,
            cancel,
        }
    }

    /// Main loop. Returns once the batch channel closes or `cancel` fires.
    pub async fn run(mut self) -> Result<()> {
        info!("retest runtime started");

        loop {
            let batch = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("cancellation requested; stopping runtime");
                    break;
                }
                maybe = self.batches.recv() => match maybe {
                    Some(batch) => batch,
                    None => {
                        info!("batch channel closed; exiting");
                        break;
                    }
                },
            };

            self.handle_batch(&batch).await;
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Resolve, run and dispose of one batch. Failures are logged; the
    /// caller simply waits for the next batch.
    pub async fn handle_batch(&self, batch: &Batch) {
        let packages = self.resolve_packages(batch).await;
        if packages.is_empty() {
            info!(files = batch.len(), "no packages resolved for changed files; skipping run");
            return;
        }

        let mut result = match self.runner.run(&packages).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, ?packages, "failed to execute tests");
                return;
            }
        };

        log_summary(&result);

        if let Err(err) = result.close() {
            warn!(error = %err, "failed to delete test results");
        }
    }

    /// Map every changed path to its package, dropping duplicates while
    /// keeping first-seen order.
    pub async fn resolve_packages(&self, batch: &Batch) -> Vec<String> {
        let mut paths = batch.paths();
        paths.sort();

        let mut packages: Vec<String> = Vec::new();
        for path in paths {
            match self.runner.find_package(path).await {
                Ok(pkg) => {
                    debug!(?path, package = %pkg, "resolved package");
                    if !packages.contains(&pkg) {
                        packages.push(pkg);
                    }
                }
                Err(err) => {
                    error!(?path, error = %err, "failed to find package");
                }
            }
        }
        packages
    }
}

fn log_summary(result: &RunResult) {
    let mut names: Vec<&String> = result.packages.keys().collect();
    names.sort();

    for name in names {
        let pkg = &result.packages[name];
        info!(
            package = %pkg.name,
            pass = pkg.pass,
            passed = pkg.passed,
            failed = pkg.failed,
            skipped = pkg.skipped,
            coverage = pkg.coverage,
            elapsed = pkg.elapsed,
            "package result"
        );
    }

    info!(
        run_id = %result.id,
        exit_code = result.exit_code,
        duration = ?result.duration,
        packages = result.packages.len(),
        all_passed = result.all_packages_passed(),
        "test run complete"
    );
}
