// src/engine/mod.rs

//! Glue between the watcher and the runner.
//!
//! Each batch received from the watcher is resolved to the set of owning
//! packages, those packages are re-tested, and the result is disposed of.
//! The async loop lives in [`runtime`].

pub mod runtime;

pub use runtime::Runtime;
