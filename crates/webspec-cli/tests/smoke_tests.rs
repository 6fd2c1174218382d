//! Smoke tests for the webspec CLI
//!
//! Each test builds a throwaway project (config, static site, spec files)
//! and drives the real binary against it.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command for the webspec binary
fn webspec() -> Command {
    Command::cargo_bin("webspec").expect("webspec binary should exist")
}

const SITE: &str = r##"pages:
  http://localhost/contact:
    elements:
      - selectors: ['[name="first_name"]']
        tag: input
      - selectors: ['[name="last_name"]']
        tag: input
      - selectors: ['#contact-us']
        tag: a
        width: 0
        height: 0
        navigates_to: http://localhost/thank-you
  http://localhost/thank-you:
    elements:
      - selectors: ['#contact_reply h1']
        tag: h1
        text: Thank You for your Message!
"##;

const CONFIG: &str = "specPattern: \"specs/*.yaml\"\ndefaultTimeoutMs: 300\npollIntervalMs: 20\nsite: site.yaml\n";

/// Project with the shared site and config plus one spec file
fn project(spec: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("site.yaml"), SITE).unwrap();
    fs::write(temp.path().join("webspec.config.yaml"), CONFIG).unwrap();
    fs::create_dir_all(temp.path().join("specs")).unwrap();
    fs::write(temp.path().join("specs/contact.yaml"), spec).unwrap();
    temp
}

fn run_in(temp: &TempDir) -> Command {
    let mut cmd = webspec();
    cmd.current_dir(temp.path()).args(["--color", "never", "run"]);
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    webspec()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    webspec()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_no_args_fails() {
    webspec().assert().failure();
}

// ============================================================================
// Run Tests
// ============================================================================

#[test]
fn test_passing_group_exits_zero() {
    let temp = project(
        r#"
describe: contact form
cases:
  - it: types a first name
    steps:
      - visit: http://localhost/contact
      - get: '[name="first_name"]'
        type: Joe
      - expect: { selector: '[name="first_name"]', text: Joe }
  - it: types a last name
    steps:
      - visit: http://localhost/contact
      - get: '[name="last_name"]'
        type: Blogs
"#,
    );

    run_in(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS contact form > types a first name"))
        .stdout(predicate::str::contains("2 passed, 0 failed"));
}

#[test]
fn test_only_case_runs_alone() {
    let temp = project(
        r#"
describe: contact form
cases:
  - it: first
    steps:
      - visit: http://localhost/nowhere
  - it: second
    only: true
    steps:
      - visit: http://localhost/contact
"#,
    );

    run_in(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("contact form > first (not run)"))
        .stdout(predicate::str::contains("1 passed"));
}

#[test]
fn test_unresolved_selector_times_out() {
    let temp = project(
        r#"
describe: contact form
cases:
  - it: contact us
    steps:
      - visit: http://localhost/contact
      - get: '#missing'
        click: true
"#,
    );

    run_in(&temp)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[timed_out]"))
        .stdout(predicate::str::contains(
            "Expected to find element: #missing, but never found it.",
        ));
}

#[test]
fn test_force_click_on_zero_size_link() {
    let temp = project(
        r#"
describe: contact form
cases:
  - it: forced
    steps:
      - visit: http://localhost/contact
      - get: '#contact-us'
        click: { force: true }
      - url_contains: thank-you
  - it: unforced
    steps:
      - visit: http://localhost/contact
      - get: '#contact-us'
        click: true
"#,
    );

    run_in(&temp)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("PASS contact form > forced"))
        .stdout(predicate::str::contains("FAIL contact form > unforced [failed]"))
        .stdout(predicate::str::contains("0px x 0px"));
}

#[test]
fn test_json_format() {
    let temp = project(
        "describe: g\ncases:\n  - it: visits\n    steps:\n      - visit: http://localhost/contact\n",
    );

    let output = run_in(&temp)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["driver"], "static");
    assert_eq!(report["results"][0]["status"], "passed");
    assert_eq!(report["results"][0]["path"][1], "visits");
}

#[test]
fn test_timeout_flag_overrides_config() {
    let temp = project(
        "describe: g\ncases:\n  - it: waits\n    steps:\n      - visit: http://localhost/contact\n      - expect: { selector: '#never' }\n",
    );

    run_in(&temp)
        .args(["--timeout", "50"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Timed out retrying after 50ms"));
}

#[test]
fn test_unknown_browser_is_usage_error() {
    let temp = project("describe: g\ncases: []\n");
    run_in(&temp)
        .args(["--browser", "chrome"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("browser 'chrome' is not available"));
}

#[test]
fn test_invalid_spec_file_is_error() {
    let temp = project("describe: g\ncases:\n  - it: bad\n    steps:\n      - hover: '#a'\n");
    run_in(&temp)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("contact.yaml"));
}

#[test]
fn test_no_specs_is_error() {
    let temp = TempDir::new().unwrap();
    webspec()
        .current_dir(temp.path())
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no spec files match"));
}

// ============================================================================
// List and Init Tests
// ============================================================================

#[test]
fn test_list_shows_markers() {
    let temp = project(
        "describe: g\ncases:\n  - it: a\n    only: true\n  - it: b\n    skip: true\n",
    );
    webspec()
        .current_dir(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("- a [only] (0 steps)"))
        .stdout(predicate::str::contains("- b [skip] (0 steps)"))
        .stdout(predicate::str::contains("2 cases in 1 files"));
}

#[test]
fn test_init_then_run() {
    let temp = TempDir::new().unwrap();
    webspec()
        .current_dir(temp.path())
        .args(["--quiet", "init"])
        .assert()
        .success();

    assert!(temp.path().join("webspec.config.yaml").exists());
    assert!(temp.path().join("downloads").is_dir());

    webspec()
        .current_dir(temp.path())
        .args(["--color", "never", "run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 passed"));
}
