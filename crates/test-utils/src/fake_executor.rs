use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use retest::errors::Result;
use retest::exec::{CommandOutput, ExecFuture, Executor};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

impl ExecCall {
    /// First argument, i.e. the tool subcommand (`test`, `list`, ...).
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

type Handler = dyn Fn(&ExecCall) -> Result<CommandOutput> + Send + Sync;

/// A fake executor that:
/// - records every command it was asked to run
/// - answers with whatever the handler returns, without spawning anything.
///
/// Clones share the call log.
#[derive(Clone)]
pub struct FakeExecutor {
    handler: Arc<Handler>,
    calls: Arc<Mutex<Vec<ExecCall>>>,
}

impl FakeExecutor {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ExecCall) -> Result<CommandOutput> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with the same output and exit code.
    pub fn with_output(output: impl Into<Vec<u8>>, exit_code: i32) -> Self {
        let output = output.into();
        Self::new(move |_| Ok(CommandOutput::new(output.clone(), exit_code)))
    }

    pub fn calls(&self) -> Vec<ExecCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for FakeExecutor {
    fn execute<'a>(&'a self, dir: &'a Path, program: &'a str, args: &'a [String]) -> ExecFuture<'a> {
        let call = ExecCall {
            dir: dir.to_path_buf(),
            program: program.to_string(),
            args: args.to_vec(),
        };
        self.calls.lock().unwrap().push(call.clone());
        let res = (self.handler)(&call);
        Box::pin(async move { res })
    }
}
