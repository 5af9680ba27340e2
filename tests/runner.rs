// tests/runner.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use retest::errors::RetestError;
use retest::exec::CommandOutput;
use retest::fs::mock::MockFileSystem;
use retest::fs::{FileSystem, RealFileSystem};
use retest::runner::runner::{find_package_args, test_args};
use retest::runner::{Runner, RunnerOptions, COVERPROFILE_FILE};
use retest_test_utils::{init_tracing, output_of, with_timeout, EventLine, FakeExecutor};

fn options(scratch_root: &str) -> RunnerOptions {
    RunnerOptions {
        bin: "go".to_string(),
        scratch_root: Some(PathBuf::from(scratch_root)),
    }
}

fn passing_output() -> Vec<u8> {
    output_of([
        EventLine::new("run").package("example.com/p").build(),
        EventLine::new("pass").package("example.com/p").test("TestA").elapsed(0.01).build(),
        EventLine::new("output")
            .package("example.com/p")
            .output("coverage: 75.0% of statements\n")
            .build(),
        EventLine::new("pass").package("example.com/p").elapsed(0.02).build(),
    ])
}

#[test]
fn test_command_line_shapes() {
    let args = test_args(Path::new("/tmp/run/coverprofile.out"), &["a".to_string(), "b".to_string()]);
    assert_eq!(
        args,
        vec!["test", "-json", "-cover", "-coverprofile", "/tmp/run/coverprofile.out", "a", "b"]
    );

    let args = find_package_args(Path::new("/proj/pkg"));
    assert_eq!(args, vec!["list", "-find", "-f", "{{.ImportPath}}", "/proj/pkg"]);
}

#[tokio::test]
async fn test_run_invokes_tool_and_populates_result() {
    init_tracing();
    let fs = MockFileSystem::new();
    let exec = FakeExecutor::with_output(passing_output(), 0);
    let runner = Runner::new("/proj", options("/scratch"), exec.clone(), Arc::new(fs.clone()));

    let packages = vec!["example.com/p".to_string()];
    let mut result = with_timeout(runner.run(&packages)).await.unwrap();

    let calls = exec.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].subcommand(), Some("test"));
    assert_eq!(calls[0].dir, PathBuf::from("/proj"));
    assert_eq!(calls[0].program, "go");

    let scratch = result.scratch_dir().unwrap().to_path_buf();
    assert_eq!(scratch, PathBuf::from("/scratch").join(result.id.to_string()));
    let coverprofile = scratch.join(COVERPROFILE_FILE);
    assert_eq!(result.coverprofile_path(), Some(coverprofile.clone()));
    assert_eq!(
        calls[0].args,
        test_args(&coverprofile, &packages),
    );

    assert!(result.pass);
    assert_eq!(result.exit_code, 0);
    assert!(result.end >= result.start);
    let pkg = &result.packages["example.com/p"];
    assert!(pkg.pass);
    assert_eq!(pkg.passed, 1);
    assert_eq!(pkg.coverage, 75.0);

    result.close().unwrap();
    assert_eq!(fs.removed_dirs(), vec![scratch]);
}

#[tokio::test]
async fn test_failing_suite_is_not_an_error() {
    let output = output_of([
        EventLine::new("run").package("p").build(),
        EventLine::new("fail").package("p").test("TestA").build(),
        EventLine::new("fail").package("p").build(),
    ]);
    let fs = MockFileSystem::new();
    let runner = Runner::new(
        "/proj",
        options("/scratch"),
        FakeExecutor::with_output(output, 1),
        Arc::new(fs),
    );

    let mut result = runner.run(&["p".to_string()]).await.unwrap();

    assert_eq!(result.exit_code, 1);
    assert!(result.pass);
    assert!(!result.all_packages_passed());
    assert_eq!(result.packages["p"].failed, 1);
    result.close().unwrap();
}

#[tokio::test]
async fn test_launch_failure_removes_scratch_dir() {
    let fs = MockFileSystem::new();
    let exec = FakeExecutor::new(|call| {
        Err(RetestError::Launch {
            program: call.program.clone(),
            dir: call.dir.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    });
    let runner = Runner::new("/proj", options("/scratch"), exec, Arc::new(fs.clone()));

    let err = runner.run(&["p".to_string()]).await.unwrap_err();

    assert!(matches!(err, RetestError::Launch { .. }));
    let created = fs.created_dirs();
    assert_eq!(created.len(), 2, "root and run dir: {created:?}");
    assert_eq!(fs.removed_dirs(), vec![created[1].clone()]);
}

#[tokio::test]
async fn test_parse_failure_removes_scratch_dir() {
    let output = output_of([
        EventLine::new("output").package("p").output("coverage: .%\n").build(),
    ]);
    let fs = MockFileSystem::new();
    let runner = Runner::new(
        "/proj",
        options("/scratch"),
        FakeExecutor::with_output(output, 0),
        Arc::new(fs.clone()),
    );

    let err = runner.run(&["p".to_string()]).await.unwrap_err();

    assert!(matches!(err, RetestError::Coverage { .. }));
    assert_eq!(fs.removed_dirs().len(), 1);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let fs = MockFileSystem::new();
    let runner = Runner::new(
        "/proj",
        options("/scratch"),
        FakeExecutor::with_output(passing_output(), 0),
        Arc::new(fs.clone()),
    );

    let mut result = runner.run(&["example.com/p".to_string()]).await.unwrap();
    result.close().unwrap();
    result.close().unwrap();

    assert_eq!(fs.removed_dirs().len(), 1);
    assert!(result.scratch_dir().is_none());
    assert!(result.coverprofile_path().is_none());
}

#[tokio::test]
async fn test_scratch_root_is_created_once() {
    let fs = MockFileSystem::new();
    let runner = Runner::new(
        "/proj",
        options("/scratch"),
        FakeExecutor::with_output(passing_output(), 0),
        Arc::new(fs.clone()),
    );

    let pkgs = vec!["example.com/p".to_string()];
    let (a, b) = tokio::join!(runner.run(&pkgs), runner.run(&pkgs));
    let (mut a, mut b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.id, b.id);
    assert_ne!(a.scratch_dir(), b.scratch_dir());

    let root_creations = fs
        .created_dirs()
        .iter()
        .filter(|p| p.as_path() == Path::new("/scratch"))
        .count();
    assert_eq!(root_creations, 1);
    assert_eq!(runner.scratch_root().root().await.unwrap(), Path::new("/scratch"));

    a.close().unwrap();
    b.close().unwrap();
}

#[tokio::test]
async fn test_find_package_returns_trimmed_import_path() {
    let exec = FakeExecutor::with_output("example.com/proj/pkg\n", 0);
    let runner = Runner::new(
        "/proj",
        options("/scratch"),
        exec.clone(),
        Arc::new(MockFileSystem::new()),
    );

    let pkg = runner.find_package(Path::new("/proj/pkg/a.go")).await.unwrap();

    assert_eq!(pkg, "example.com/proj/pkg");
    assert_eq!(exec.calls()[0].subcommand(), Some("list"));
    assert_eq!(exec.calls()[0].args, find_package_args(Path::new("/proj/pkg")));
    assert_eq!(exec.calls()[0].dir, PathBuf::from("/proj"));
}

#[tokio::test]
async fn test_find_package_failure_carries_output() {
    let exec = FakeExecutor::with_output("go: cannot find main module\n", 1);
    let runner = Runner::new(
        "/proj",
        options("/scratch"),
        exec,
        Arc::new(MockFileSystem::new()),
    );

    match runner.find_package(Path::new("/proj/pkg/a.go")).await {
        Err(RetestError::PackageResolution {
            path,
            exit_code,
            output,
        }) => {
            assert_eq!(path, PathBuf::from("/proj/pkg/a.go"));
            assert_eq!(exit_code, 1);
            assert!(output.contains("cannot find main module"));
        }
        other => panic!("Expected PackageResolution error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_find_package_empty_output_is_an_error() {
    let runner = Runner::new(
        "/proj",
        options("/scratch"),
        FakeExecutor::with_output("   \n", 0),
        Arc::new(MockFileSystem::new()),
    );

    let err = runner.find_package(Path::new("/proj/a.go")).await.unwrap_err();
    assert!(matches!(err, RetestError::PackageResolution { .. }));
}

#[tokio::test]
async fn test_scratch_dir_on_disk_is_deleted_on_close() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("scratch");
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let runner = Runner::new(
        tmp.path(),
        RunnerOptions {
            bin: "go".to_string(),
            scratch_root: Some(root.clone()),
        },
        FakeExecutor::with_output(passing_output(), 0),
        fs,
    );

    let mut result = runner.run(&["example.com/p".to_string()]).await.unwrap();
    let dir = result.scratch_dir().unwrap().to_path_buf();
    assert!(dir.is_dir());
    assert!(dir.starts_with(&root));

    result.close().unwrap();
    assert!(!dir.exists());
    assert!(root.is_dir());
}
