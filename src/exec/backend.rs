// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The runner talks to an `Executor` instead of spawning processes itself.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production implementation in [`super::command`].

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::errors::Result;

/// What a finished command left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output and standard error, interleaved line by line in
    /// arrival order.
    pub output: Vec<u8>,
    /// Process exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn new(output: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Future returned by [`Executor::execute`].
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + 'a>>;

/// Trait abstracting how external commands are run.
///
/// `Err` is reserved for "the command could not run at all" (launch
/// failure, cancellation). A command that ran and exited non-zero is an
/// `Ok` with a non-zero `exit_code`.
pub trait Executor: Send + Sync {
    fn execute<'a>(&'a self, dir: &'a Path, program: &'a str, args: &'a [String]) -> ExecFuture<'a>;
}
