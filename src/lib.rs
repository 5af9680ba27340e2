// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod runner;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::engine::Runtime;
use crate::exec::CommandExecutor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::runner::Runner;
use crate::watch::{NotifyFactory, Watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - watcher
/// - runner + executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let root = project_root(args.root.as_deref())?;
    let cfg = config::resolve(&root, args.config.as_deref())?;

    if args.dry_run {
        print_dry_run(&root, &cfg);
        return Ok(());
    }

    // One token for everything: watcher loop and in-flight commands.
    let cancel = CancellationToken::new();
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let mut watcher = Watcher::new(
        root.clone(),
        cfg.watcher_options(),
        Arc::clone(&fs),
        Arc::new(NotifyFactory),
        &cancel,
    );
    let batches = watcher
        .take_channel()
        .context("watcher channel already taken")?;

    let executor = CommandExecutor::new(cancel.clone());
    let runner = Runner::new(root.clone(), cfg.runner_options(), executor, fs);

    info!(root = ?root, "starting watcher");
    watcher.start()?;

    // Ctrl-C -> graceful shutdown.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("shut down message received");
            cancel.cancel();
        });
    }

    let runtime = Runtime::new(batches, runner, cancel.clone());
    let outcome = runtime.run().await;

    cancel.cancel();
    watcher.stop().await?;

    Ok(outcome?)
}

/// Canonical project root: the given directory or the working directory.
fn project_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().context("error getting working directory")?,
    };
    root.canonicalize()
        .with_context(|| format!("resolving project root {:?}", root))
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(root: &Path, cfg: &ConfigFile) {
    let watch = cfg.watch_section();
    let runner = cfg.runner_section();

    println!("retest dry-run");
    println!("  root = {}", root.display());
    println!("  watch.interval_ms = {}", watch.interval_ms);
    println!("  watch.skip = {:?}", watch.skip);
    println!("  watch.source_patterns = {:?}", watch.source_patterns);
    println!("  runner.bin = {}", runner.bin);
    match &runner.scratch_root {
        Some(dir) => println!("  runner.scratch_root = {}", dir.display()),
        None => println!("  runner.scratch_root = <system temp dir>"),
    }
}
