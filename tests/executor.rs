// tests/executor.rs
//
// Runs real child processes through `sh`.
#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use retest::errors::RetestError;
use retest::exec::{CommandExecutor, Executor};
use retest_test_utils::{init_tracing, with_timeout};

fn sh(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string()]
}

#[tokio::test]
async fn test_combines_stdout_and_stderr() {
    init_tracing();
    let exec = CommandExecutor::new(CancellationToken::new());

    let out = with_timeout(exec.execute(
        Path::new("."),
        "sh",
        &sh("echo out; echo err 1>&2; echo done"),
    ))
    .await
    .unwrap();

    let text = String::from_utf8(out.output).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["done", "err", "out"]);
    assert_eq!(out.exit_code, 0);
}

#[tokio::test]
async fn test_non_zero_exit_is_reported_not_raised() {
    let exec = CommandExecutor::new(CancellationToken::new());

    let out = with_timeout(exec.execute(Path::new("."), "sh", &sh("echo failing; exit 3")))
        .await
        .unwrap();

    assert_eq!(out.exit_code, 3);
    assert!(!out.success());
    assert_eq!(out.output, b"failing\n");
}

#[tokio::test]
async fn test_runs_in_the_given_directory() {
    let dir = tempfile::tempdir().unwrap();
    let exec = CommandExecutor::new(CancellationToken::new());

    let out = with_timeout(exec.execute(dir.path(), "sh", &sh("pwd -P")))
        .await
        .unwrap();

    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(String::from_utf8(out.output).unwrap().trim(), expected.to_str().unwrap());
}

#[tokio::test]
async fn test_missing_program_is_a_launch_error() {
    let exec = CommandExecutor::new(CancellationToken::new());

    let err = exec
        .execute(Path::new("."), "retest-definitely-not-a-binary", &[])
        .await
        .unwrap_err();

    match err {
        RetestError::Launch { program, .. } => {
            assert_eq!(program, "retest-definitely-not-a-binary");
        }
        other => panic!("Expected Launch error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_kills_the_process() {
    let cancel = CancellationToken::new();
    let exec = CommandExecutor::new(cancel.clone());

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
    }

    let res = with_timeout(exec.execute(Path::new("."), "sh", &sh("sleep 30"))).await;
    assert!(matches!(res, Err(RetestError::Cancelled)));
}
