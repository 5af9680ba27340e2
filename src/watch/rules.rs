// src/watch/rules.rs

//! Which directories are pruned and which files count as sources.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Default skip list, matched against base names.
pub const DEFAULT_SKIP: &[&str] = &["vendor"];

/// Default source patterns, matched against file names.
pub const DEFAULT_SOURCE_PATTERNS: &[&str] = &["*.go"];

/// Compiled pruning and source-recognition rules.
///
/// A name is skipped when it starts with `.`, ends with `~`, or matches one
/// of the configured skip globs. The same rules are used for the initial
/// walk, for directories created later, and for incoming events.
#[derive(Clone)]
pub struct SkipRules {
    skip_set: GlobSet,
    source_set: GlobSet,
}

impl fmt::Debug for SkipRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipRules")
            .field("skip", &self.skip_set.len())
            .field("sources", &self.source_set.len())
            .finish()
    }
}

impl SkipRules {
    pub fn new(skip: &[String], source_patterns: &[String]) -> Result<Self> {
        let skip_set = build_globset(skip).context("building skip globset")?;
        let source_set =
            build_globset(source_patterns).context("building source globset")?;
        Ok(Self {
            skip_set,
            source_set,
        })
    }

    /// Rules built from [`DEFAULT_SKIP`] and [`DEFAULT_SOURCE_PATTERNS`].
    pub fn defaults() -> Result<Self> {
        let skip: Vec<String> = DEFAULT_SKIP.iter().map(|s| s.to_string()).collect();
        let sources: Vec<String> = DEFAULT_SOURCE_PATTERNS
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self::new(&skip, &sources)
    }

    /// Whether a single base name should be pruned.
    pub fn should_skip_name(&self, name: &str) -> bool {
        name.starts_with('.') || name.ends_with('~') || self.skip_set.is_match(name)
    }

    /// Whether `path` lies in (or is) a pruned location below `root`.
    ///
    /// Every component under the root is checked; the root itself never is.
    /// Paths outside the root fall back to checking their base name.
    pub fn should_skip_path(&self, root: &Path, path: &Path) -> bool {
        match path.strip_prefix(root) {
            Ok(rel) => rel
                .components()
                .any(|c| self.should_skip_name(&c.as_os_str().to_string_lossy())),
            Err(_) => path
                .file_name()
                .map(|n| self.should_skip_name(&n.to_string_lossy()))
                .unwrap_or(false),
        }
    }

    /// Whether the file name of `path` matches a source pattern.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| self.source_set.is_match(Path::new(n)))
            .unwrap_or(false)
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
