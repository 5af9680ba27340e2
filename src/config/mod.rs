// src/config/mod.rs

//! Configuration loading and validation for retest.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and compile the watch rules (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve, DEFAULT_CONFIG_FILE};
pub use model::{ConfigFile, RawConfigFile, RunnerSection, WatchSection};
