// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs tests in a fresh shell process each.
//!
//! The shell sources three files in turn: runtime helpers, the script itself from its own path,
//! and a generated program holding instrumented copies of the fixtures and the test body. The
//! program keeps every step on the line it has in the script, so an ERR trap reports failing
//! commands against script lines. Control events are appended to a file in a per-test temporary
//! directory, which is read back once the shell exits.

use super::imp::{ExecutionOutput, ProcessExit, TestExecutor, TestPlan};
use crate::{
    config::RunConfig,
    errors::TestExecuteError,
    helpers::shell_exit_status,
    script::{FunctionBody, FunctionDef, Step},
};
use camino::{Utf8Path, Utf8PathBuf};
use debug_ignore::DebugIgnore;
use std::{
    ffi::OsString,
    fs, io,
    process::Output,
    thread,
    time::{Duration, Instant},
};
use swrite::{SWrite, swrite};
use tracing::{debug, warn};

/// Sources the runtime, the script and then the generated program, with `$0` set to the script
/// path.
const LAUNCHER: &str = concat!(
    "__shunit_runtime=$1; __shunit_program=$2; shift 2; ",
    ". \"$__shunit_runtime\"; . \"$0\"; . \"$__shunit_program\"",
);

const EVENTS_VAR: &str = "__SHUNIT_EVENTS";
const CAPTURE_VAR: &str = "__SHUNIT_CAPTURE";

/// How often a test with a timeout is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long a timed-out test has to exit after SIGTERM before it is killed.
const TERMINATE_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// A [`TestExecutor`] that runs each test in its own shell process.
#[derive(Clone, Debug)]
pub struct ShellExecutor {
    shell: String,
    entry_point: String,
    timeout: Option<Duration>,
    capture_program: DebugIgnore<OsString>,
}

impl ShellExecutor {
    /// Creates a new executor.
    ///
    /// `capture_program` is invoked by the in-test `run` helper as `<program> __capture -- <cmd>`,
    /// and must print shell assignments for the capture slots.
    pub fn new(config: &RunConfig, capture_program: impl Into<OsString>) -> Self {
        Self {
            shell: config.shell.clone(),
            entry_point: config.entry_point.clone(),
            timeout: config.timeout,
            capture_program: DebugIgnore(capture_program.into()),
        }
    }

    /// Waits for the shell to exit, killing it if it runs for longer than the timeout.
    fn wait(&self, handle: &duct::Handle) -> io::Result<ProcessExit> {
        let Some(timeout) = self.timeout else {
            return Ok(ProcessExit::Exited(exit_status(handle.wait()?)));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(output) = handle.try_wait()? {
                return Ok(ProcessExit::Exited(exit_status(output)));
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        debug!("test timed out after {}", humantime::format_duration(timeout));
        terminate(handle)?;
        Ok(ProcessExit::TimedOut(timeout))
    }
}

impl TestExecutor for ShellExecutor {
    fn execute(&self, plan: &TestPlan<'_>) -> Result<ExecutionOutput, TestExecuteError> {
        let temp_dir = camino_tempfile::Builder::new()
            .prefix("shunit-")
            .tempdir()
            .map_err(TestExecuteError::TempDir)?;
        let runtime_path = temp_dir.path().join("runtime.sh");
        let program_path = temp_dir.path().join("program.sh");
        let events_path = temp_dir.path().join("events");
        let output_path = temp_dir.path().join("output");

        let program = generate_program(plan);
        debug!(
            "{}: generated program is {} bytes",
            plan.test.name(),
            program.len()
        );
        write_file(&runtime_path, generate_runtime(plan.force_run, &self.entry_point))?;
        write_file(&program_path, program)?;

        let test = plan.test;
        let script_path = plan.test_list.path();
        let script_arg = source_path(script_path);
        let cmd = duct::cmd(
            self.shell.as_str(),
            [
                "-c",
                LAUNCHER,
                script_arg.as_str(),
                runtime_path.as_str(),
                program_path.as_str(),
            ],
        )
        .env(EVENTS_VAR, events_path.as_str())
        .env(CAPTURE_VAR, self.capture_program.as_os_str())
        .env("SHUNIT_TEST_NAME", test.name())
        .env("SHUNIT_TEST_INDEX", test.index().to_string())
        .stdin_null()
        .stderr_to_stdout()
        .stdout_path(output_path.as_std_path())
        .unchecked();

        #[cfg(unix)]
        let cmd = cmd.before_spawn(|cmd| {
            use std::os::unix::process::CommandExt;
            // A process group of its own, so that a timeout can signal everything the test
            // started.
            cmd.process_group(0);
            Ok(())
        });

        let start_time = Instant::now();
        debug!("{}: spawning `{}` for {}", test.name(), self.shell, script_path);
        let handle = cmd.start().map_err(|err| TestExecuteError::Spawn {
            shell: self.shell.clone(),
            err,
        })?;
        let exit = self.wait(&handle).map_err(|err| TestExecuteError::Wait {
            shell: self.shell.clone(),
            err,
        })?;
        let time_taken = start_time.elapsed();

        let events = read_if_exists(&events_path)?;
        let output = read_if_exists(&output_path)?;
        Ok(ExecutionOutput {
            events,
            exit,
            output,
            time_taken,
        })
    }
}

/// Generates the helpers every test can call, sourced before the script.
pub fn generate_runtime(force_run: bool, entry_point: &str) -> String {
    let mut out = String::new();

    out.push_str(concat!(
        "__shunit_emit() { printf '%s\\n' \"$*\" >> \"$__SHUNIT_EVENTS\"; }\n",
        // A probe that returns non-zero to restore `$?` marks the ERR trap that follows as its
        // own.
        "__shunit_step() { __shunit_emit \"step $2\"; ",
        "if [ \"$1\" -ne 0 ]; then __shunit_probed=1; fi; return \"$1\"; }\n",
        "__shunit_check() { if [ \"$1\" -ne 0 ]; then __shunit_emit \"fail $2 $1\"; ",
        "__shunit_probed=1; fi; return \"$1\"; }\n",
        "__shunit_err() { ",
        "if [ -n \"${__shunit_probed:-}\" ]; then __shunit_probed=; return 0; fi; ",
        "if [ \"$3\" = \"$0\" ] || { [ \"$3\" = \"$__shunit_program\" ] && ",
        "[ \"$2\" -le \"$__shunit_lines\" ]; }; then __shunit_emit \"err $2 $1\"; fi; }\n",
        "it() { :; }\n",
        "describe() { :; }\n",
        "this_test() { :; }\n",
    ));
    if force_run {
        out.push_str("skip() { :; }\n");
    } else {
        out.push_str(concat!(
            "skip() { local __shunit_note=\"$*\"; ",
            "__shunit_emit \"skip ${__shunit_note//$'\\n'/ }\"; }\n",
        ));
    }
    out.push_str(concat!(
        "run() { if [ \"$#\" -eq 0 ]; then return 0; fi; ",
        "eval \"$(\"$__SHUNIT_CAPTURE\" __capture -- \"$@\")\"; return 0; }\n",
    ));
    swrite!(out, "{entry_point}() {{ :; }}\n");
    out
}

/// Generates the program that runs a single test, sourced after the script.
///
/// The instrumented phase functions come first, laid out line for line with the script. The
/// driver that runs the phases follows the last script line.
pub fn generate_program(plan: &TestPlan<'_>) -> String {
    let source = plan.test_list.script().source();
    let mut layout = AlignedLayout::new(source.line_count());
    let mut trailer = String::from("set +e\nstatus=0\noutput=\nlines=()\n");

    let phases = [
        ("__shunit_setup", plan.test_list.setup(), None),
        (
            "__shunit_body",
            Some(plan.test.definition()),
            Some(plan.body.steps.as_slice()),
        ),
        ("__shunit_teardown", plan.test_list.teardown(), None),
    ];
    for (name, def, steps) in phases {
        match def {
            Some(def) => layout.write_function(name, def, steps),
            None => swrite!(trailer, "{name}() {{ :; }}\n"),
        }
    }

    swrite!(trailer, "__shunit_lines={}\n", source.line_count());
    trailer.push_str(concat!(
        "__shunit_phase() { __shunit_emit \"phase-start $1\"; \"$2\"; ",
        "__shunit_emit \"phase-end $1 $?\"; }\n",
        "__shunit_finish() { __shunit_emit \"exit $?\"; ",
        "if [ -z \"${__shunit_torn_down:-}\" ]; then __shunit_torn_down=1; ",
        "__shunit_phase teardown __shunit_teardown; fi; }\n",
        "trap __shunit_finish EXIT\n",
        "set -E\n",
        "trap '__shunit_err \"$?\" \"$LINENO\" \"${BASH_SOURCE[0]}\"' ERR\n",
        "__shunit_phase setup __shunit_setup\n",
        "__shunit_phase body __shunit_body\n",
    ));

    let mut out = layout.into_string();
    out.push_str(&trailer);
    out
}

/// Instrumented functions laid out so that each step starts on its line in the script.
#[derive(Debug)]
struct AlignedLayout {
    lines: Vec<AlignedLine>,
    // The last line written by the current function.
    last: usize,
}

#[derive(Debug, Default)]
struct AlignedLine {
    text: String,
    needs_separator: bool,
}

impl AlignedLayout {
    fn new(line_count: usize) -> Self {
        let mut lines = Vec::new();
        lines.resize_with(line_count, AlignedLine::default);
        Self { lines, last: 1 }
    }

    /// Writes an instrumented copy of `def` as the function `name`.
    ///
    /// `steps` overrides the steps of a brace-delimited body.
    fn write_function(&mut self, name: &str, def: &FunctionDef, steps: Option<&[Step]>) {
        self.last = def.line();
        self.push_command(def.line(), &format!("{name}() {{"));
        self.line_mut(def.line()).needs_separator = false;

        let close_line = match def.body() {
            FunctionBody::Subshell => {
                self.write_step(def.line(), def.name());
                self.last
            }
            FunctionBody::Steps(def_steps) => {
                let steps = steps.unwrap_or(def_steps);
                if steps.is_empty() {
                    self.push_command(def.line(), ":");
                }
                for step in steps {
                    self.write_step(step.line, &step.text);
                }
                def.end_line().max(self.last)
            }
        };
        self.push_command(close_line, "}");
    }

    fn write_step(&mut self, line: usize, text: &str) {
        // A step that shares a line with the end of a multi-line step is moved after it.
        let start = line.max(self.last);
        self.push_command(start, &format!("__shunit_step $? {line}"));

        let mut end = start;
        for (offset, piece) in text.split('\n').enumerate() {
            if offset == 0 {
                self.push_command(start, piece);
            } else {
                end = start + offset;
                self.push_command(end, piece);
            }
        }

        // Nothing may follow a heredoc delimiter on its line.
        let check_line = if has_heredoc(text) { end + 1 } else { end };
        self.push_command(check_line, &format!("__shunit_check $? {line}"));
    }

    fn push_command(&mut self, line: usize, command: &str) {
        self.last = self.last.max(line);
        let line = self.line_mut(line);
        if line.needs_separator {
            line.text.push_str("; ");
        } else if !line.text.is_empty() {
            line.text.push(' ');
        }
        line.text.push_str(command);
        // `cmd &; next` is a syntax error.
        line.needs_separator = !command.trim_end().ends_with('&');
    }

    fn line_mut(&mut self, line: usize) -> &mut AlignedLine {
        let idx = line.max(1) - 1;
        if idx >= self.lines.len() {
            self.lines.resize_with(idx + 1, AlignedLine::default);
        }
        &mut self.lines[idx]
    }

    fn into_string(self) -> String {
        let mut out = String::new();
        for line in self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

fn has_heredoc(text: &str) -> bool {
    text.match_indices("<<")
        .any(|(idx, _)| !text[idx + 2..].starts_with('<') && !text[..idx].ends_with('<'))
}

/// Returns the path to source the script from. `.` searches `PATH` for names without a slash.
fn source_path(path: &Utf8Path) -> String {
    if path.as_str().contains('/') {
        path.as_str().to_owned()
    } else {
        format!("./{path}")
    }
}

fn write_file(path: &Utf8Path, contents: String) -> Result<(), TestExecuteError> {
    fs::write(path, contents).map_err(|err| TestExecuteError::WriteProgram {
        path: path.to_owned(),
        err,
    })
}

fn exit_status(output: &Output) -> i32 {
    shell_exit_status(output.status)
}

#[cfg(unix)]
fn terminate(handle: &duct::Handle) -> io::Result<()> {
    use nix::{
        sys::signal::{Signal, killpg},
        unistd::Pid,
    };

    if let Some(&pid) = handle.pids().first() {
        // The process group may already be gone.
        if let Err(errno) = killpg(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            debug!("failed to send SIGTERM to process group {pid}: {errno}");
        }

        let deadline = Instant::now() + TERMINATE_GRACE_PERIOD;
        while Instant::now() < deadline {
            if handle.try_wait()?.is_some() {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
        warn!("test did not exit after SIGTERM, killing it");
        if let Err(errno) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!("failed to send SIGKILL to process group {pid}: {errno}");
        }
    }
    handle.kill()?;
    handle.wait()?;
    Ok(())
}

#[cfg(not(unix))]
fn terminate(handle: &duct::Handle) -> io::Result<()> {
    handle.kill()?;
    handle.wait()?;
    Ok(())
}

/// Reads a file written by the test, treating a missing file as empty.
fn read_if_exists(path: &Utf8Path) -> Result<String, TestExecuteError> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(TestExecuteError::ReadOutput {
            path: Utf8PathBuf::from(path),
            err,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{DiscoveryConfig, DiscoveryOrder, ShunitConfig},
        list::TestList,
        runner::{
            interceptor::{FailureInterceptor, PhaseLines},
            skip::rewrite_skip,
        },
        script::{ParsedScript, ScriptSource},
    };
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;

    fn make_list(path: impl Into<Utf8PathBuf>, script: &str) -> TestList {
        let script = ParsedScript::parse(ScriptSource::new(path, script)).expect("parses");
        TestList::new(
            script,
            &DiscoveryConfig {
                order: DiscoveryOrder::Declaration,
                check_duplicates: true,
            },
        )
        .expect("no duplicates")
    }

    fn plan<'a>(list: &'a TestList, name: &str, force_run: bool) -> TestPlan<'a> {
        let test = list
            .iter()
            .find(|test| test.name() == name)
            .expect("test exists");
        TestPlan {
            test_list: list,
            test,
            body: rewrite_skip(test.definition().steps(), force_run),
            force_run,
        }
    }

    #[test]
    fn program_keeps_script_lines() {
        let list = make_list(
            "t.sh",
            indoc! {r#"
                teardown() { rm -f /tmp/x; }
                testcase_a() {
                    it "does a"
                    if true; then
                        false
                    fi
                }
                run_tests "$@""#},
        );
        let program = generate_program(&plan(&list, "testcase_a", false));

        assert!(
            program.starts_with(concat!(
                "__shunit_teardown() { __shunit_step $? 1; rm -f /tmp/x; __shunit_check $? 1; }\n",
                "__shunit_body() {\n",
                "__shunit_step $? 3; it \"does a\"; __shunit_check $? 3\n",
                "__shunit_step $? 4; if true; then\n",
                "        false\n",
                "    fi; __shunit_check $? 4\n",
                "}\n",
                "\n",
                "set +e\n",
            )),
            "{program}"
        );
        // Phases the script doesn't define are no-ops.
        assert!(program.contains("__shunit_setup() { :; }\n"));
        assert!(program.contains("__shunit_lines=8\n"));
        assert!(program.contains("set -E\ntrap '__shunit_err \"$?\" \"$LINENO\""));
        assert!(program.ends_with("__shunit_phase body __shunit_body\n"));
    }

    #[test]
    fn heredocs_and_background_jobs() {
        let list = make_list(
            "t.sh",
            indoc! {"
                testcase_h() {
                    cat <<EOF | grep -q x
                x
                EOF
                    sleep 1 &
                    wait
                }
            "},
        );
        let program = generate_program(&plan(&list, "testcase_h", false));
        assert!(
            program.starts_with(concat!(
                "__shunit_body() {\n",
                "__shunit_step $? 2; cat <<EOF | grep -q x\n",
                "x\n",
                "EOF\n",
                "__shunit_check $? 2; __shunit_step $? 5; sleep 1 & __shunit_check $? 5\n",
                "__shunit_step $? 6; wait; __shunit_check $? 6\n",
                "}\n",
                "set +e\n",
            )),
            "{program}"
        );
    }

    #[test]
    fn program_follows_force_run() {
        let list = make_list("t.sh", "testcase_a() {\n  skip\n  false\n}\n");

        let program = generate_program(&plan(&list, "testcase_a", false));
        assert!(program.starts_with(concat!(
            "__shunit_body() {\n",
            "__shunit_step $? 2; skip; __shunit_check $? 2; ",
            "__shunit_step $? 2; return 0; __shunit_check $? 2\n",
            "\n",
            "}\n",
        )));

        let program = generate_program(&plan(&list, "testcase_a", true));
        assert!(program.starts_with(concat!(
            "__shunit_body() {\n",
            "__shunit_step $? 2; skip; __shunit_check $? 2\n",
            "__shunit_step $? 3; false; __shunit_check $? 3\n",
            "}\n",
        )));
    }

    #[test]
    fn runtime_follows_force_run() {
        let runtime = generate_runtime(false, "main");
        assert!(runtime.contains("__shunit_emit \"skip "));
        assert!(runtime.ends_with("main() { :; }\n"));

        let runtime = generate_runtime(true, "run_tests");
        assert!(runtime.contains("skip() { :; }\n"));
        assert!(runtime.ends_with("run_tests() { :; }\n"));
    }

    #[test]
    fn subshell_bodies_run_as_one_step() {
        let list = make_list("t.sh", "testcase_sub() (\n  exit 3\n)\n");
        let program = generate_program(&plan(&list, "testcase_sub", false));
        assert!(program.starts_with(
            "__shunit_body() { __shunit_step $? 1; testcase_sub; __shunit_check $? 1; }\n\n\n"
        ));
    }

    #[test]
    fn scripts_are_sourced_by_path() {
        assert_eq!(source_path(Utf8Path::new("t.sh")), "./t.sh");
        assert_eq!(source_path(Utf8Path::new("tests/t.sh")), "tests/t.sh");
        assert_eq!(source_path(Utf8Path::new("/tmp/t.sh")), "/tmp/t.sh");
    }

    #[cfg(unix)]
    mod bash {
        use super::*;
        use pretty_assertions::assert_eq;

        const SCRIPT: &str = indoc! {r#"
            . "$(dirname "${BASH_SOURCE[0]}")/lib.sh"

            setup() {
                echo "setting up"
            }

            teardown() {
                echo "tearing down $SHUNIT_TEST_NAME"
            }

            testcase_pass() {
                it "passes"
                [ 1 -eq 1 ]
            }

            testcase_fail() {
                false
                echo "still running"
                [ 1 -eq 2 ]
            }

            testcase_exit() {
                true
                exit 4
            }

            testcase_skip() {
                skip "not today"
                false
            }

            testcase_slow() {
                sleep 30
            }

            testcase_nested() {
                if true; then
                    false
                    echo "after the failure"
                fi
            }

            testcase_helper() {
                helper
            }

            helper() {
                [ -d /nonexistent ]
                true
            }

            testcase_sourced() {
                [ "$(greet)" = hello ]
                [ "$(greet)" = goodbye ]
                fails_quietly
            }

            run_tests "$@"
        "#};

        const LIB: &str = indoc! {"
            greet() {
                echo hello
            }

            fails_quietly() {
                false
                true
            }
        "};

        fn execute(
            dir: &Utf8TempDir,
            name: &str,
            timeout: Option<Duration>,
        ) -> (TestList, ExecutionOutput) {
            let path = dir.path().join("t.sh");
            fs::write(&path, SCRIPT).expect("wrote script");
            fs::write(dir.path().join("lib.sh"), LIB).expect("wrote lib");
            let list = make_list(path, SCRIPT);
            let mut config = ShunitConfig::default_config().run().clone();
            config.timeout = timeout;
            let executor = ShellExecutor::new(&config, "/nonexistent/shunit");
            let output = executor
                .execute(&plan(&list, name, false))
                .expect("test executes");
            (list, output)
        }

        fn failures(list: &TestList, name: &str, output: &ExecutionOutput) -> Vec<(usize, i32)> {
            let test = list
                .iter()
                .find(|test| test.name() == name)
                .expect("test exists");
            let mut interceptor = FailureInterceptor::new(
                list.script().source(),
                PhaseLines {
                    setup: list.setup().map(FunctionDef::line),
                    body: test.line(),
                    teardown: list.teardown().map(FunctionDef::line),
                },
            );
            interceptor.handle_events(&output.events);
            let status = match output.exit {
                ProcessExit::Exited(status) => Some(status),
                ProcessExit::TimedOut(_) => None,
            };
            interceptor
                .finish(status)
                .failures
                .iter()
                .map(|failure| (failure.line, failure.status))
                .collect()
        }

        #[test]
        fn passing_test_runs_every_phase() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let (list, output) = execute(&dir, "testcase_pass", None);
            assert_eq!(output.exit, ProcessExit::Exited(0));
            assert_eq!(output.output, "setting up\ntearing down testcase_pass\n");
            assert_eq!(
                failures(&list, "testcase_pass", &output),
                Vec::<(usize, i32)>::new()
            );
        }

        #[test]
        fn failing_steps_do_not_stop_the_body() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let (list, output) = execute(&dir, "testcase_fail", None);
            assert_eq!(output.exit, ProcessExit::Exited(0));
            assert!(output.output.contains("still running\n"));
            assert_eq!(
                failures(&list, "testcase_fail", &output),
                vec![(17, 1), (19, 1)]
            );
        }

        #[test]
        fn exit_runs_teardown() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let (list, output) = execute(&dir, "testcase_exit", None);
            assert_eq!(output.exit, ProcessExit::Exited(4));
            assert!(output.output.ends_with("tearing down testcase_exit\n"));
            assert_eq!(failures(&list, "testcase_exit", &output), vec![(24, 4)]);
        }

        #[test]
        fn failure_inside_compound_statement() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let (list, output) = execute(&dir, "testcase_nested", None);
            assert!(output.output.contains("after the failure\n"));
            assert_eq!(failures(&list, "testcase_nested", &output), vec![(38, 1)]);
        }

        #[test]
        fn failure_inside_helper_function() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let (list, output) = execute(&dir, "testcase_helper", None);
            assert_eq!(failures(&list, "testcase_helper", &output), vec![(48, 1)]);
        }

        #[test]
        fn script_sees_its_own_path() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let (list, output) = execute(&dir, "testcase_sourced", None);
            assert!(!output.output.contains("No such file"), "{}", output.output);
            // Failures inside sourced libraries are not attributed to the script.
            assert_eq!(failures(&list, "testcase_sourced", &output), vec![(54, 1)]);
        }

        #[test]
        fn skip_is_reported() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let (list, output) = execute(&dir, "testcase_skip", None);
            assert!(output.events.contains("skip not today\n"));
            assert_eq!(
                failures(&list, "testcase_skip", &output),
                Vec::<(usize, i32)>::new()
            );
        }

        #[test]
        fn slow_tests_time_out() {
            let dir = Utf8TempDir::with_prefix("shunit-shell-").expect("created temp dir");
            let timeout = Duration::from_millis(200);
            let (_, output) = execute(&dir, "testcase_slow", Some(timeout));
            assert_eq!(output.exit, ProcessExit::TimedOut(timeout));
            assert!(output.time_taken < Duration::from_secs(10));
        }
    }
}
