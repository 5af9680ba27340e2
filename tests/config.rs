// tests/config.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

use retest::config::{load_and_validate, resolve, ConfigFile, RawConfigFile, DEFAULT_CONFIG_FILE};
use retest::errors::RetestError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_defaults() {
    let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();

    assert_eq!(cfg.watch_section().interval_ms, 500);
    assert_eq!(cfg.watch_section().skip, vec!["vendor".to_string()]);
    assert_eq!(cfg.watch_section().source_patterns, vec!["*.go".to_string()]);
    assert_eq!(cfg.runner_section().bin, "go");
    assert!(cfg.runner_section().scratch_root.is_none());

    assert_eq!(cfg.watcher_options().interval, Duration::from_millis(500));
    assert_eq!(cfg.runner_options().bin, "go");
}

#[test]
fn test_full_config_is_loaded() {
    let file = config_file(
        r#"
[watch]
interval_ms = 250
skip = ["vendor", "testdata"]
source_patterns = ["*.go", "go.mod"]

[runner]
bin = "/usr/local/go/bin/go"
scratch_root = "/tmp/retest-runs"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let opts = cfg.watcher_options();

    assert_eq!(opts.interval, Duration::from_millis(250));
    assert!(opts.rules.should_skip_name("testdata"));
    assert!(opts.rules.is_source_file(std::path::Path::new("go.mod")));
    assert_eq!(cfg.runner_options().bin, "/usr/local/go/bin/go");
    assert_eq!(
        cfg.runner_options().scratch_root,
        Some(PathBuf::from("/tmp/retest-runs"))
    );
}

#[test]
fn test_zero_interval_is_rejected() {
    let file = config_file("[watch]\ninterval_ms = 0\n");

    match load_and_validate(file.path()) {
        Err(RetestError::ConfigError(msg)) => assert!(msg.contains("interval_ms")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_source_patterns_are_rejected() {
    let file = config_file("[watch]\nsource_patterns = []\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(RetestError::ConfigError(_))
    ));
}

#[test]
fn test_blank_bin_is_rejected() {
    let file = config_file("[runner]\nbin = \"  \"\n");

    match load_and_validate(file.path()) {
        Err(RetestError::ConfigError(msg)) => assert!(msg.contains("bin")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_invalid_glob_is_a_config_error() {
    let file = config_file("[watch]\nskip = [\"[\"]\n");

    match load_and_validate(file.path()) {
        Err(RetestError::ConfigError(msg)) => assert!(msg.contains("[watch]")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_malformed_toml() {
    let file = config_file("[watch\ninterval_ms = ");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(RetestError::TomlError(_))
    ));
}

#[test]
fn test_resolve_prefers_project_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        "[watch]\ninterval_ms = 42\n",
    )
    .unwrap();

    let cfg = resolve(dir.path(), None).unwrap();
    assert_eq!(cfg.watch_section().interval_ms, 42);
}

#[test]
fn test_resolve_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let cfg = resolve(dir.path(), None).unwrap();
    assert_eq!(cfg.watch_section().interval_ms, 500);
}

#[test]
fn test_resolve_explicit_path_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(matches!(
        resolve(dir.path(), Some(&missing)),
        Err(RetestError::IoError(_))
    ));
}
