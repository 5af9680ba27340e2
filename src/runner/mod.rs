// src/runner/mod.rs

//! Test-run pipeline.
//!
//! - [`model`] holds the per-run data model (`RunResult`, `Package`, ...).
//! - [`parser`] folds the test tool's JSON event stream into that model.
//! - [`scratch`] owns scratch directory allocation.
//! - [`runner`] orchestrates one run and resolves files to packages.

pub mod model;
pub mod parser;
#[allow(clippy::module_inception)]
pub mod runner;
pub mod scratch;

pub use model::{Action, Package, RunResult, ScratchDir, Test, TestEvent, COVERPROFILE_FILE};
pub use parser::parse_output;
pub use runner::{Runner, RunnerFuture, RunnerOptions, TestRunner, DEFAULT_BIN};
pub use scratch::ScratchRoot;
