// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for choosing which tests run.

use super::shunit;
use indoc::indoc;
use integration_tests::shunit_cli::fixture_path;
use pretty_assertions::assert_eq;
use shunit_runner::exit_codes::ShunitExitCode;

#[test]
fn test_select_by_index() {
    let script = fixture_path("lifecycle.sh");
    let output = shunit().args([script.as_str(), "0"]).output();

    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        " ✓ writes to scratch\n\n1 test, 0 failures\n"
    );
}

#[test]
fn test_selection_follows_discovery_order() {
    let script = fixture_path("lifecycle.sh");
    let output = shunit()
        .args(["-l", script.as_str(), "testcase_first", "2", "0", "*SCRATCH"])
        .output();

    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            2 tests
            0:writes to scratch:testcase_first
            2:reports every failing line:testcase_third
        "},
    );
}

#[test]
fn test_select_by_pattern() {
    let script = fixture_path("lifecycle.sh");

    let output = shunit().args(["-l", script.as_str(), "testcase_?ec*"]).output();
    assert_eq!(
        output.stdout_as_str(),
        "1 test\n1:doesn't see state from the first test:testcase_second\n",
        "{output}"
    );

    // Descriptions match case-insensitively.
    let output = shunit()
        .args(["-l", script.as_str(), "REPORTS every*"])
        .output();
    assert_eq!(
        output.stdout_as_str(),
        "1 test\n2:reports every failing line:testcase_third\n",
        "{output}"
    );
}

#[test]
fn test_unmatched_spec() {
    let script = fixture_path("basic.sh");

    let output = shunit().args([script.as_str(), "no such test"]).output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::SELECTION_FAILED),
        "{output}"
    );
    assert_eq!(output.stdout_as_str(), "", "no tests are run");
    assert!(
        output
            .stderr_as_str()
            .contains("no test description matches `no such test`"),
        "{output}"
    );

    let output = shunit().args([script.as_str(), "testcase_nope"]).output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::SELECTION_FAILED),
        "{output}"
    );
    assert_eq!(output.stdout_as_str(), "");

    let output = shunit().args([script.as_str(), "5"]).output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::SELECTION_FAILED),
        "{output}"
    );
    assert!(
        output.stderr_as_str().contains("test index 5 is out of range"),
        "{output}"
    );
}

#[test]
fn test_invalid_spec() {
    let script = fixture_path("basic.sh");
    let output = shunit().args([script.as_str(), "testcase_[a"]).output();

    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::USAGE_ERROR),
        "{output}"
    );
    assert!(
        output.stderr_as_str().contains("invalid test spec `testcase_[a`"),
        "{output}"
    );
}
