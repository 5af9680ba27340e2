// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs external commands (the test tool and the package resolver) to
//! completion and hands back their combined output and exit code.
//!
//! - [`backend`] provides the `Executor` trait and `CommandOutput`; tests
//!   replace the executor with a fake implementation.
//! - [`command`] is the `tokio::process` implementation used in production.

pub mod backend;
pub mod command;

pub use backend::{CommandOutput, ExecFuture, Executor};
pub use command::CommandExecutor;
