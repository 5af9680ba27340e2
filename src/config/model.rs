// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::runner::{RunnerOptions, DEFAULT_BIN};
use crate::watch::rules::{DEFAULT_SKIP, DEFAULT_SOURCE_PATTERNS};
use crate::watch::{SkipRules, WatcherOptions};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// interval_ms = 500
/// skip = ["vendor", "testdata"]
/// source_patterns = ["*.go"]
///
/// [runner]
/// bin = "go"
/// scratch_root = "/tmp/retest"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub runner: RunnerSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Debounce interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Base-name globs of directories (and files) to ignore, in addition to
    /// hidden (`.`-prefixed) and backup (`~`-suffixed) names.
    #[serde(default = "default_skip")]
    pub skip: Vec<String>,

    /// File-name globs of files whose changes trigger a run.
    #[serde(default = "default_source_patterns")]
    pub source_patterns: Vec<String>,
}

fn default_interval_ms() -> u64 {
    500
}

fn default_skip() -> Vec<String> {
    DEFAULT_SKIP.iter().map(|s| s.to_string()).collect()
}

fn default_source_patterns() -> Vec<String> {
    DEFAULT_SOURCE_PATTERNS.iter().map(|s| s.to_string()).collect()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            skip: default_skip(),
            source_patterns: default_source_patterns(),
        }
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Test tool binary.
    #[serde(default = "default_bin")]
    pub bin: String,

    /// Parent directory for per-run scratch directories.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
}

fn default_bin() -> String {
    DEFAULT_BIN.to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            bin: default_bin(),
            scratch_root: None,
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so the skip rules are
/// known to compile.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchSection,
    runner: RunnerSection,
    rules: SkipRules,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        runner: RunnerSection,
        rules: SkipRules,
    ) -> Self {
        Self {
            watch,
            runner,
            rules,
        }
    }

    pub fn watch_section(&self) -> &WatchSection {
        &self.watch
    }

    pub fn runner_section(&self) -> &RunnerSection {
        &self.runner
    }

    pub fn watcher_options(&self) -> WatcherOptions {
        WatcherOptions {
            interval: Duration::from_millis(self.watch.interval_ms),
            rules: self.rules.clone(),
        }
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            bin: self.runner.bin.clone(),
            scratch_root: self.runner.scratch_root.clone(),
        }
    }
}
