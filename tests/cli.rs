// tests/cli.rs

use clap::Parser;

use retest::cli::{CliArgs, LogLevel};
use retest::logging::build_filter;

#[test]
fn test_defaults() {
    let args = CliArgs::try_parse_from(["retest"]).unwrap();

    assert!(args.root.is_none());
    assert!(args.config.is_none());
    assert!(args.log_level.is_none());
    assert!(!args.dry_run);
}

#[test]
fn test_all_flags() {
    let args = CliArgs::try_parse_from([
        "retest",
        "--root",
        "/proj",
        "--config",
        "/proj/custom.toml",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(args.root.as_deref(), Some(std::path::Path::new("/proj")));
    assert_eq!(args.config.as_deref(), Some(std::path::Path::new("/proj/custom.toml")));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
}

#[test]
fn test_unknown_level_is_rejected() {
    assert!(CliArgs::try_parse_from(["retest", "--log-level", "loud"]).is_err());
}

#[test]
fn test_cli_level_overrides_env() {
    let filter = build_filter(Some(LogLevel::Debug), Some("warn"));
    assert_eq!(filter.to_string(), "debug");
}

#[test]
fn test_env_directives_are_honoured() {
    let filter = build_filter(None, Some("retest::watch=trace"));
    assert_eq!(filter.to_string(), "retest::watch=trace");
}

#[test]
fn test_default_and_invalid_env_fall_back_to_info() {
    assert_eq!(build_filter(None, None).to_string(), "info");
    assert_eq!(build_filter(None, Some("  ")).to_string(), "info");
    assert_eq!(build_filter(None, Some("retest=loud")).to_string(), "info");
}
