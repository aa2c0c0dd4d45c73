use assert_cmd::Command;
use predicates::prelude::*;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn verity() -> Command {
    let mut cmd = Command::cargo_bin("verity").unwrap();
    cmd.env_remove("VERITY_LOG");
    cmd
}

fn fixture(name: &str) -> String {
    format!("{FIXTURES}/{name}")
}

#[test]
fn passing_suite_exits_zero() {
    verity()
        .arg(fixture("passing"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Feature: Arithmetic"))
        .stdout(predicate::str::contains("✓ rounds within tolerance"))
        .stdout(predicate::str::contains("3 tests: 3 passed, 0 failed, 0 errors"))
        .stdout(predicate::str::contains("helper").not());
}

#[test]
fn failing_suite_explains_the_mismatch() {
    verity()
        .arg(fixture("failing"))
        .assert()
        .code(64)
        .stdout(predicate::str::contains("FAILURE in lengths differ"))
        .stdout(predicate::str::contains("test_lists.yaml:5"))
        .stdout(predicate::str::contains("X has 3 items whereas Y has only 2"))
        .stdout(predicate::str::contains("2 tests: 1 passed, 1 failed, 0 errors"));
}

#[test]
fn errors_win_over_failures() {
    verity()
        .arg(fixture("erroring"))
        .assert()
        .code(88)
        .stdout(predicate::str::contains("SpecialSyntaxDisabledError"))
        .stdout(predicate::str::contains("connection refused"))
        .stdout(predicate::str::contains("3 tests: 0 passed, 1 failed, 2 errors"));
}

#[test]
fn immediate_stops_at_the_first_failure() {
    verity()
        .args(["-i", &fixture("erroring")])
        .assert()
        .code(64)
        .stdout(predicate::str::contains("stopped at the first failure"))
        .stdout(predicate::str::contains("1 tests: 0 passed, 1 failed, 0 errors"))
        .stdout(predicate::str::contains("connection refused").not());
}

#[test]
fn quiet_reporter_prints_only_the_summary() {
    verity()
        .args(["--reporter", "quiet", &fixture("passing")])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Feature:").not())
        .stdout(predicate::str::contains("3 tests: 3 passed"));
}

#[test]
fn nested_classes_and_subdirectories_are_discovered() {
    verity()
        .args(["--reap-warnings", &fixture("nested")])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("3 tests: 3 passed"))
        .stdout(predicate::str::contains("inner is deprecated"))
        .stdout(predicate::str::contains("test_not_collected").not());
}

#[test]
fn excludes_and_globs_narrow_the_run() {
    verity()
        .args(["--exclude", "deeper/*", &fixture("nested")])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("2 tests: 2 passed"));

    verity()
        .args(["--glob", "*.yml", &fixture("passing")])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("1 tests: 1 passed"));
}

#[test]
fn config_file_supplies_options() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("verity.yaml");
    std::fs::write(&config, "immediate: true\n").unwrap();
    verity()
        .arg("--config")
        .arg(&config)
        .arg(fixture("erroring"))
        .assert()
        .code(64)
        .stdout(predicate::str::contains("stopped at the first failure"));

    std::fs::write(&config, "immediately: true\n").unwrap();
    verity()
        .arg("--config")
        .arg(&config)
        .arg(fixture("erroring"))
        .assert()
        .code(1);
}

#[test]
fn missing_path_is_a_discovery_error() {
    verity()
        .arg(fixture("does-not-exist"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("verity::loader::io"));
}

#[test]
fn unknown_reporter_is_rejected_by_the_parser() {
    verity()
        .args(["--reporter", "json", &fixture("passing")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("possible values"));
}
