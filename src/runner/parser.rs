// src/runner/parser.rs

//! Folds `go test -json` output into per-package state.
//!
//! Every line is decoded on its own. Lines from different packages and tests
//! may be interleaved arbitrarily, so all lookups go by key.

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{Result, RetestError};
use crate::runner::model::{Action, Package, Test, TestEvent};

static COVERAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]*\.?[0-9]*)\s*%").expect("coverage pattern is a valid regex")
});

/// Parse the combined output of a test run.
///
/// Undecodable lines, events without a package and test events for a
/// package that has not been seen yet are logged and skipped. A coverage
/// percentage that is not a valid number aborts the whole parse.
pub fn parse_output(input: &[u8]) -> Result<HashMap<String, Package>> {
    let mut packages: HashMap<String, Package> = HashMap::new();

    for (index, raw) in input.split(|b| *b == b'\n').enumerate() {
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let event: TestEvent = match serde_json::from_slice(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    line = index + 1,
                    error = %err,
                    text = %String::from_utf8_lossy(line),
                    "error decoding event"
                );
                continue;
            }
        };

        if event.package.is_empty() {
            debug!(?event, "skipping event without package");
            continue;
        }

        fold_event(&mut packages, event)?;
    }

    Ok(packages)
}

/// Dispatch on the presence of a test name.
fn fold_event(packages: &mut HashMap<String, Package>, event: TestEvent) -> Result<()> {
    if event.test_name().is_some() {
        if let Err(err) = handle_test_event(packages, event) {
            warn!(error = %err, "failed to handle event");
        }
        return Ok(());
    }

    handle_package_event(packages, event)
}

fn handle_package_event(packages: &mut HashMap<String, Package>, event: TestEvent) -> Result<()> {
    let pkg = packages.entry(event.package.clone()).or_insert_with(|| {
        debug!(package = %event.package, "handling new package");
        Package::new(&event.package)
    });

    match event.action {
        Action::Pass => {
            pkg.pass = true;
            pkg.elapsed = event.elapsed.unwrap_or_default();
        }
        Action::Fail => {
            pkg.pass = false;
            pkg.elapsed = event.elapsed.unwrap_or_default();
        }
        Action::Output => {
            if let Some(coverage) = parse_coverage(event.output.as_deref().unwrap_or_default())? {
                debug!(package = %pkg.name, coverage, "coverage reported");
                pkg.coverage = coverage;
            }
        }
        _ => {
            debug!(?event, "unhandled package event");
        }
    }

    Ok(())
}

fn handle_test_event(
    packages: &mut HashMap<String, Package>,
    event: TestEvent,
) -> anyhow::Result<()> {
    let pkg = packages
        .get_mut(&event.package)
        .ok_or_else(|| anyhow!("package does not exist: {}", event.package))?;

    let name = event.test_name().unwrap_or_default().to_string();
    let action = event.action;
    let elapsed = event.elapsed.unwrap_or_default();

    if !pkg.tests.contains_key(&name) {
        pkg.tests.insert(
            name.clone(),
            Test {
                name: name.clone(),
                first_event: event,
            },
        );
    }

    match action {
        Action::Pass => {
            pkg.passed += 1;
            pkg.elapsed = elapsed;
        }
        Action::Fail => {
            pkg.failed += 1;
            pkg.elapsed = elapsed;
        }
        Action::Skip => {
            pkg.skipped += 1;
            pkg.elapsed = elapsed;
        }
        other => {
            debug!(package = %pkg.name, test = %name, action = ?other, "unhandled test event");
        }
    }

    Ok(())
}

/// Extract the first percentage from a line of output.
pub fn parse_coverage(text: &str) -> Result<Option<f64>> {
    let Some(caps) = COVERAGE_RE.captures(text) else {
        return Ok(None);
    };
    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    raw.parse::<f64>()
        .map(Some)
        .map_err(|source| RetestError::Coverage {
            text: raw.to_string(),
            source,
        })
}
