// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetestError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The notification backend could not be initialised or the initial
    /// directory walk failed.
    #[error("failed to start watcher: {context}")]
    WatcherStart {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A component was driven through an invalid lifecycle transition.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The external command could not be started at all.
    #[error("failed to launch '{program}' in {dir:?}: {source}")]
    Launch {
        program: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The toolchain could not map a changed file to its package.
    #[error("failed to find package for {path:?} (exit code {exit_code}): {output}")]
    PackageResolution {
        path: PathBuf,
        exit_code: i32,
        output: String,
    },

    /// A coverage percentage was found in test output but is not a number.
    #[error("failed to convert coverage '{text}' to float: {source}")]
    Coverage {
        text: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RetestError>;
