// src/runner/scratch.rs

//! Run-scoped scratch directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;
use uuid::Uuid;

use crate::errors::{Result, RetestError};
use crate::fs::FileSystem;
use crate::runner::model::ScratchDir;

/// Parent location for per-run scratch directories.
///
/// The root is created lazily, at most once per instance, even when several
/// runs race to create it. Each run then gets its own subdirectory named by
/// its run id.
pub struct ScratchRoot {
    configured: Option<PathBuf>,
    root: OnceCell<PathBuf>,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for ScratchRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchRoot")
            .field("configured", &self.configured)
            .field("root", &self.root.get())
            .finish_non_exhaustive()
    }
}

impl ScratchRoot {
    /// `configured = None` places the root in a fresh `retest-<uuid>`
    /// directory under the system temp dir.
    pub fn new(configured: Option<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            configured,
            root: OnceCell::new(),
            fs,
        }
    }

    /// The root directory, creating it on first use.
    pub async fn root(&self) -> Result<&Path> {
        let root = self
            .root
            .get_or_try_init(|| async {
                let path = match &self.configured {
                    Some(path) => path.clone(),
                    None => std::env::temp_dir().join(format!("retest-{}", Uuid::new_v4())),
                };
                self.fs.create_dir_all(&path)?;
                info!(root = ?path, "scratch root created");
                Ok::<_, RetestError>(path)
            })
            .await?;
        Ok(root.as_path())
    }

    /// Create the scratch directory for run `id`.
    pub async fn create_run_dir(&self, id: Uuid) -> Result<ScratchDir> {
        let dir = self.root().await?.join(id.to_string());
        self.fs.create_dir_all(&dir)?;
        Ok(ScratchDir::new(dir, Arc::clone(&self.fs)))
    }
}
