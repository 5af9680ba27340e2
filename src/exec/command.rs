// src/exec/command.rs

//! Production executor backed by `tokio::process`.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{Result, RetestError};
use crate::exec::backend::{CommandOutput, ExecFuture, Executor};

/// Runs commands as child processes.
///
/// Process lifetime is bound to `cancel`: when it fires, the in-flight child
/// is killed and the call returns [`RetestError::Cancelled`].
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    cancel: CancellationToken,
}

impl CommandExecutor {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    async fn run(&self, dir: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(?dir, program, ?args, "spawning command");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| RetestError::Launch {
            program: program.to_string(),
            dir: dir.to_path_buf(),
            source,
        })?;

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => None,
            res = wait_with_combined_output(&mut child) => Some(res),
        };

        let Some(res) = outcome else {
            info!(program, "cancellation requested; killing process");
            if let Err(e) = child.kill().await {
                warn!(program, error = %e, "failed to kill child process on cancellation");
            }
            return Err(RetestError::Cancelled);
        };

        let (output, status) = res?;
        let exit_code = status.code().unwrap_or(-1);

        debug!(
            program,
            exit_code,
            bytes = output.len(),
            "command exited"
        );

        Ok(CommandOutput { output, exit_code })
    }
}

impl Executor for CommandExecutor {
    fn execute<'a>(&'a self, dir: &'a Path, program: &'a str, args: &'a [String]) -> ExecFuture<'a> {
        Box::pin(self.run(dir, program, args))
    }
}

/// Drain stdout and stderr concurrently into one buffer, then reap the
/// child.
async fn wait_with_combined_output(child: &mut Child) -> std::io::Result<(Vec<u8>, ExitStatus)> {
    let mut stdout = child
        .stdout
        .take()
        .map(|s| BufReader::new(s).split(b'\n'));
    let mut stderr = child
        .stderr
        .take()
        .map(|s| BufReader::new(s).split(b'\n'));

    let mut combined = Vec::new();

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            seg = next_segment(&mut stdout) => match seg? {
                Some(line) => push_line(&mut combined, line),
                None => stdout = None,
            },
            seg = next_segment(&mut stderr) => match seg? {
                Some(line) => push_line(&mut combined, line),
                None => stderr = None,
            },
        }
    }

    let status = child.wait().await?;
    Ok((combined, status))
}

/// Next line of a stream; never resolves once the stream is gone.
async fn next_segment<R>(lines: &mut Option<Split<BufReader<R>>>) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_segment().await,
        None => std::future::pending().await,
    }
}

fn push_line(buf: &mut Vec<u8>, line: Vec<u8>) {
    buf.extend_from_slice(&line);
    buf.push(b'\n');
}
