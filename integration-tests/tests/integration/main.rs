// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests
//!
//! These tests run the `shunit-dup` binary, which is exactly the same as `shunit`, on the scripts
//! in `fixtures/` with a real bash. Colors are always disabled so output can be compared as text.

use camino::Utf8PathBuf;
use camino_tempfile::Utf8TempDir;
use indoc::indoc;
use integration_tests::shunit_cli::{ShunitCli, fixture_path};
use pretty_assertions::assert_eq;
use shunit_runner::exit_codes::ShunitExitCode;
use std::fs;

mod selection;

fn shunit() -> ShunitCli {
    ShunitCli::new(env!("CARGO_BIN_EXE_shunit-dup"))
}

/// Writes `contents` to `name` in `dir`, returning the path.
fn write_script(dir: &Utf8TempDir, name: &str, contents: &str) -> Utf8PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("wrote script");
    path
}

#[test]
fn test_run_pass_and_fail() {
    let script = fixture_path("basic.sh");
    let output = shunit().arg(script.as_str()).output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        format!(
            " ✓ adds numbers\n \
              ✗ fails on false\n   \
                (in test file {script}, line 10)\n     \
                  `false' failed with 1\n\
             \n\
             2 tests, 1 failure\n"
        ),
    );
}

#[test]
fn test_run_skip() {
    let script = fixture_path("skip.sh");
    let output = shunit()
        .env("DATABASE_URL", "")
        .arg(script.as_str())
        .output();

    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
             - waits for the feature (skipped: not ready)
             - skips without a database (skipped)
             ✓ still runs

            3 tests, 0 failures, 2 skipped
        "},
    );
}

#[test]
fn test_force_run() {
    let script = fixture_path("skip.sh");
    let output = shunit()
        .env("DATABASE_URL", "")
        .args(["--force-run", script.as_str()])
        .output();

    assert_eq!(output.exit_code(), Some(2), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        format!(
            " ✗ waits for the feature\n   \
                (in test file {script}, line 6)\n     \
                  `false' failed with 1\n \
              ✗ skips without a database\n   \
                (in test file {script}, line 14)\n     \
                  `false' failed with 1\n \
              ✓ still runs\n\
             \n\
             3 tests, 2 failures\n"
        ),
    );
}

#[test]
fn test_fixtures_and_isolation() {
    let script = fixture_path("lifecycle.sh");
    let output = shunit().arg(script.as_str()).output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        format!(
            " ✓ writes to scratch\n \
              ✓ doesn't see state from the first test\n \
              ✗ reports every failing line\n   \
                (in test file {script}, line 27)\n     \
                  `[ 1 -eq 2 ]' failed with 1\n   \
                (in test file {script}, line 29)\n     \
                  `grep -q needle /dev/null' failed with 1\n\
             \n\
             3 tests, 1 failure\n"
        ),
    );
}

#[test]
fn test_verbose_shows_failed_output() {
    let script = fixture_path("lifecycle.sh");
    let output = shunit().args(["--verbose", script.as_str()]).output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    let stdout = output.stdout_as_str();
    assert!(
        stdout.contains(
            "       setup for testcase_third\n       \
                    keeps going\n       \
                    teardown for testcase_third\n"
        ),
        "{output}"
    );
    // Output of passing tests is never shown.
    assert!(!stdout.contains("setup for testcase_first"), "{output}");
}

#[test]
fn test_exit_in_body() {
    let script = fixture_path("exit.sh");
    let output = shunit().args(["--verbose", script.as_str()]).output();

    assert_eq!(output.exit_code(), Some(2), "{output}");
    let stdout = output.stdout_as_str();
    assert!(
        stdout.starts_with(&format!(
            " ✗ exits with a status\n   \
                (in test file {script}, line 9)\n     \
                  `exit 7' failed with 7\n       \
                    torn down\n \
              ✓ exits early without failing\n \
              ✗ reports the helper and its caller\n   \
                (in test file {script}, line 24)\n     \
                  `[ \"$1\" -gt 0 ]' failed with 1\n   \
                (in test file {script}, line 20)\n     \
                  `check_positive -1' failed with 1\n"
        )),
        "{output}"
    );
    assert!(stdout.ends_with("\n3 tests, 2 failures\n"), "{output}");
}

#[test]
fn test_nested_failures() {
    let script = fixture_path("nested.sh");
    let output = shunit().arg(script.as_str()).output();

    assert_eq!(output.exit_code(), Some(2), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        format!(
            " ✗ reports a failure inside an if block\n   \
                (in test file {script}, line 8)\n     \
                  `false' failed with 1\n \
              ✗ reports a failure inside a helper\n   \
                (in test file {script}, line 24)\n     \
                  `[ -z \"$1\" ]' failed with 1\n \
              ✓ sources helpers next to the script\n\
             \n\
             3 tests, 2 failures\n"
        ),
    );
}

#[test]
fn test_capture_helper() {
    let script = fixture_path("capture.sh");
    let output = shunit().args(["--verbose", script.as_str()]).output();

    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
             ✓ captures output and status
             ✓ reports missing commands
             ✓ starts with empty slots

            3 tests, 0 failures
        "},
    );
}

#[test]
fn test_timeout() {
    let script = fixture_path("slow.sh");
    let output = shunit()
        .args(["--timeout", "500ms", script.as_str()])
        .output();

    assert_eq!(output.exit_code(), Some(1), "{output}");
    let stdout = output.stdout_as_str();
    assert!(stdout.starts_with(" ✗ hangs\n"), "{output}");
    assert!(
        stdout.contains("   (timed out after 500ms)\n"),
        "{output}"
    );
    assert!(
        stdout.ends_with(" ✓ is quick\n\n2 tests, 1 failure\n"),
        "{output}"
    );
}

#[test]
fn test_descriptions() {
    let dir = Utf8TempDir::with_prefix("shunit-integration-").expect("created temp dir");
    let script = write_script(
        &dir,
        "descriptions.sh",
        indoc! {r#"
            testcase_no_description() {
                true
            }

            testcase_empty_description() {
                it ""
                true
            }

            testcase_redeclared() {
                it "first"
                describe "second" "part"
                true
            }

            testcase_multi_line() {
                this_test "spans
                    two lines"
                true
            }

            run_tests "$@"
        "#},
    );

    let output = shunit().args(["--list-tests", script.as_str()]).output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            4 tests
            0:testcase_no_description:testcase_no_description
            1::testcase_empty_description
            2:second part:testcase_redeclared
            3:spans two lines:testcase_multi_line
        "},
    );

    let output = shunit().arg(script.as_str()).output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        " ✓ testcase_no_description\n \
          ✓ \n \
          ✓ second part\n \
          ✓ spans two lines\n\
         \n\
         4 tests, 0 failures\n",
    );
}

#[test]
fn test_no_tests() {
    let dir = Utf8TempDir::with_prefix("shunit-integration-").expect("created temp dir");
    let script = write_script(&dir, "empty.sh", "helper() { true; }\nrun_tests \"$@\"\n");

    let output = shunit().arg(script.as_str()).output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(output.stdout_as_str(), "\n0 tests, 0 failures\n");
}

#[test]
fn test_failure_count_is_exit_code() {
    let dir = Utf8TempDir::with_prefix("shunit-integration-").expect("created temp dir");
    let contents: String = (0..5)
        .map(|idx| format!("testcase_{idx}() {{\n    false\n}}\n"))
        .collect();
    let script = write_script(&dir, "failing.sh", &contents);

    let output = shunit().arg(script.as_str()).output();
    assert_eq!(output.exit_code(), Some(5), "{output}");
    assert!(
        output.stdout_as_str().ends_with("\n5 tests, 5 failures\n"),
        "{output}"
    );
}

#[test]
fn test_debug_logging() {
    let script = fixture_path("basic.sh");
    let output = shunit()
        .env("SHUNIT_LOG", "debug")
        .args(["-l", script.as_str()])
        .output();

    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    let stderr = output.stderr_as_str();
    assert_eq!(stderr.matches("discovered ").count(), 1, "{output}");
    assert!(
        stderr.contains(&format!("discovered 2 tests in {script}")),
        "{output}"
    );
}

#[test]
fn test_duplicate_tests() {
    let script = fixture_path("duplicates.sh");
    let output = shunit().arg(script.as_str()).output();

    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::DISCOVERY_FAILED),
        "{output}"
    );
    assert_eq!(output.stdout_as_str(), "", "no tests are run");
    assert!(output.stderr_as_str().contains("testcase_twice"), "{output}");

    // The last definition wins, at the position it was declared in.
    let output = shunit()
        .args(["--no-check-duplicates", "-l", script.as_str()])
        .output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            2 tests
            0:testcase_other:testcase_other
            1:second definition:testcase_twice
        "},
    );
}

#[test]
fn test_config_file() {
    let dir = Utf8TempDir::with_prefix("shunit-integration-").expect("created temp dir");
    fs::create_dir(dir.path().join(".config")).expect("created .config");
    fs::write(
        dir.path().join(".config/shunit.toml"),
        "[discovery]\norder = \"sorted\"\n",
    )
    .expect("wrote config");

    let script = fixture_path("basic.sh");
    let output = shunit()
        .current_dir(dir.path())
        .args(["-l", script.as_str()])
        .output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            2 tests
            0:fails on false:testcase_fails
            1:adds numbers:testcase_passes
        "},
    );

    // Command-line flags override the config file.
    let output = shunit()
        .current_dir(dir.path())
        .args(["-l", "--order", "declaration", script.as_str()])
        .output();
    assert_eq!(
        output.stdout_as_str(),
        indoc! {"
            2 tests
            0:adds numbers:testcase_passes
            1:fails on false:testcase_fails
        "},
    );

    let bad_config = write_script(&dir, "bad.toml", "[discovery]\norder = \"random\"\n");
    let output = shunit()
        .args(["--config-file", bad_config.as_str(), script.as_str()])
        .output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::SETUP_ERROR),
        "{output}"
    );
    assert!(output.stderr_as_str().contains("bad.toml"), "{output}");
}

#[test]
fn test_setup_errors() {
    let output = shunit().arg(fixture_path("missing.sh").as_str()).output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::SETUP_ERROR),
        "{output}"
    );
    assert!(
        output.stderr_as_str().contains("failed to read test script"),
        "{output}"
    );

    let dir = Utf8TempDir::with_prefix("shunit-integration-").expect("created temp dir");
    let script = write_script(
        &dir,
        "unterminated.sh",
        "testcase_a() {\n    echo \"oops\n}\n",
    );
    let output = shunit().arg(script.as_str()).output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::SETUP_ERROR),
        "{output}"
    );
    assert_eq!(output.stdout_as_str(), "");
}

#[test]
fn test_usage_errors() {
    let output = shunit()
        .args(["--bogus", fixture_path("basic.sh").as_str()])
        .output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::USAGE_ERROR),
        "{output}"
    );
    assert!(output.stderr_as_str().contains("--bogus"), "{output}");
    assert_eq!(output.stdout_as_str(), "");

    let output = shunit().output();
    assert_eq!(
        output.exit_code(),
        Some(ShunitExitCode::USAGE_ERROR),
        "{output}"
    );

    let output = shunit().arg("--help").output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert!(output.stdout_as_str().contains("--list-tests"), "{output}");
    assert!(!output.stdout_as_str().contains("__capture"), "{output}");
}

#[test]
fn test_capture_subcommand() {
    let output = shunit()
        .args(["__capture", "--", "sh", "-c", "echo 'a b'; echo c >&2; exit 2"])
        .output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(
        output.stdout_as_str(),
        "status=2\noutput='a b\nc'\nlines=('a b' c)\n",
    );

    let output = shunit()
        .args(["__capture", "--", "shunit-no-such-command-xyz"])
        .output();
    assert_eq!(output.exit_code(), Some(ShunitExitCode::OK), "{output}");
    assert_eq!(output.stdout_as_str(), "status=1\noutput=''\nlines=()\n");
    assert_eq!(
        output.stderr_as_str(),
        "shunit-no-such-command-xyz: command not found\n"
    );
}
