// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning the control events a test emits into failure records.
//!
//! Every instrumented step emits `step <line>` before it runs and `fail <line> <status>` if it
//! returns non-zero. The ERR trap reports `err <line> <status>` for any command in the script that
//! returns non-zero, including commands nested in compound statements or in helper functions.
//! Phases are bracketed by `phase-start <phase>` and `phase-end <phase> <status>`, and the exit
//! trap reports `exit <status>`. The interceptor replays these events in order and also accounts
//! for phases that never finished.

use crate::script::ScriptSource;
use camino::Utf8PathBuf;
use std::{fmt, str::FromStr};
use tracing::{debug, warn};

/// A lifecycle phase of a single test.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// The `setup` fixture.
    Setup,

    /// The test body.
    Body,

    /// The `teardown` fixture.
    Teardown,
}

impl Phase {
    /// Returns the name used for this phase in control events.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Body => "body",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Phase::Setup),
            "body" => Ok(Phase::Body),
            "teardown" => Ok(Phase::Teardown),
            _ => Err(()),
        }
    }
}

/// A single event written by an instrumented test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ControlEvent {
    /// A phase function is about to run.
    PhaseStart(Phase),

    /// A phase function returned.
    PhaseEnd {
        /// The phase.
        phase: Phase,
        /// The status the phase function returned.
        status: i32,
    },

    /// A step is about to run.
    Step {
        /// The line the step starts on.
        line: usize,
    },

    /// A step returned non-zero.
    Fail {
        /// The line the step starts on.
        line: usize,
        /// The status the step returned.
        status: i32,
    },

    /// A command in the script returned non-zero.
    CommandFail {
        /// The line the command starts on.
        line: usize,
        /// The status the command returned.
        status: i32,
    },

    /// The skip directive was called.
    Skip {
        /// The reason passed to `skip`, if any.
        note: Option<String>,
    },

    /// The shell is exiting.
    Exit {
        /// The exit status.
        status: i32,
    },
}

impl ControlEvent {
    /// Parses a single line from the events file.
    pub fn parse(line: &str) -> Option<Self> {
        let (kind, rest) = line.split_once(' ').unwrap_or((line, ""));
        let mut fields = rest.split(' ');
        let event = match kind {
            "phase-start" => ControlEvent::PhaseStart(fields.next()?.parse().ok()?),
            "phase-end" => ControlEvent::PhaseEnd {
                phase: fields.next()?.parse().ok()?,
                status: fields.next()?.parse().ok()?,
            },
            "step" => ControlEvent::Step {
                line: fields.next()?.parse().ok()?,
            },
            "fail" => ControlEvent::Fail {
                line: fields.next()?.parse().ok()?,
                status: fields.next()?.parse().ok()?,
            },
            "err" => ControlEvent::CommandFail {
                line: fields.next()?.parse().ok()?,
                status: fields.next()?.parse().ok()?,
            },
            "skip" => ControlEvent::Skip {
                note: (!rest.is_empty()).then(|| rest.to_owned()),
            },
            "exit" => ControlEvent::Exit {
                status: fields.next()?.parse().ok()?,
            },
            _ => return None,
        };
        Some(event)
    }
}

/// A non-zero status attributed to a line of the test script.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureRecord {
    /// The script the failing statement is in.
    pub file: Utf8PathBuf,

    /// The 1-based line the failing statement starts on.
    pub line: usize,

    /// The status the statement returned.
    pub status: i32,

    /// The trimmed text of the line.
    pub command: String,
}

/// The lines a phase is attributed to when no step inside it ran.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PhaseLines {
    /// The line `setup` is defined on, if the script defines it.
    pub setup: Option<usize>,

    /// The line the test is defined on.
    pub body: usize,

    /// The line `teardown` is defined on, if the script defines it.
    pub teardown: Option<usize>,
}

impl PhaseLines {
    fn line_for(&self, phase: Phase) -> usize {
        match phase {
            Phase::Setup => self.setup.unwrap_or(self.body),
            Phase::Body => self.body,
            Phase::Teardown => self.teardown.unwrap_or(self.body),
        }
    }
}

#[derive(Clone, Debug)]
struct OpenPhase {
    phase: Phase,
    last_step: Option<usize>,
    // The last command failure reported since `last_step` started.
    step_error: Option<(usize, i32)>,
    failed: bool,
}

/// Accumulates failure records and the skip state for a single test run.
#[derive(Debug)]
pub struct FailureInterceptor<'a> {
    source: &'a ScriptSource,
    lines: PhaseLines,
    open: Option<OpenPhase>,
    started: Vec<Phase>,
    finished: Vec<Phase>,
    failures: Vec<FailureRecord>,
    skipped: bool,
    skip_note: Option<String>,
}

/// What the interceptor saw during a run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InterceptedRun {
    /// Failures in the order they happened.
    pub failures: Vec<FailureRecord>,

    /// Whether the skip directive was called.
    pub skipped: bool,

    /// The reason passed to the first `skip` call, if any.
    pub skip_note: Option<String>,

    /// Whether the test body ran to completion.
    pub body_finished: bool,
}

impl<'a> FailureInterceptor<'a> {
    /// Creates an interceptor for one run of a test in `source`.
    pub fn new(source: &'a ScriptSource, lines: PhaseLines) -> Self {
        Self {
            source,
            lines,
            open: None,
            started: Vec::new(),
            finished: Vec::new(),
            failures: Vec::new(),
            skipped: false,
            skip_note: None,
        }
    }

    /// Handles every line of an events file, in order.
    pub fn handle_events(&mut self, events: &str) {
        for line in events.lines().filter(|line| !line.is_empty()) {
            match ControlEvent::parse(line) {
                Some(event) => self.handle_event(event),
                None => debug!("ignoring unrecognized control event: {line:?}"),
            }
        }
    }

    /// Handles a single control event.
    pub fn handle_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::PhaseStart(phase) => {
                if let Some(open) = self.open.take() {
                    debug!(
                        "phase {} started while {} was still open",
                        phase, open.phase
                    );
                }
                self.started.push(phase);
                self.open = Some(OpenPhase {
                    phase,
                    last_step: None,
                    step_error: None,
                    failed: false,
                });
            }
            ControlEvent::PhaseEnd { phase, status } => {
                let Some(open) = self.open.take() else {
                    debug!("phase {phase} ended without starting");
                    return;
                };
                if status != 0 && !open.failed {
                    // The phase function returned non-zero without a failing step, e.g. through
                    // `return 1`.
                    let line = open.last_step.unwrap_or(self.lines.line_for(phase));
                    self.record(line, status);
                }
                self.finished.push(phase);
            }
            ControlEvent::Step { line } => match &mut self.open {
                Some(open) => {
                    open.last_step = Some(line);
                    open.step_error = None;
                }
                None => debug!("step at line {line} ran outside of a phase"),
            },
            ControlEvent::Fail { line, status } => {
                if let Some(open) = &mut self.open {
                    if open.step_error.is_some() {
                        // The failing command inside the step has already been recorded.
                        return;
                    }
                    open.failed = true;
                }
                self.record(line, status);
            }
            ControlEvent::CommandFail { line, status } => {
                if let Some(open) = &mut self.open {
                    if open.step_error == Some((line, status)) {
                        debug!("line {line} failed again with {status} within the same step");
                        return;
                    }
                    open.step_error = Some((line, status));
                    open.failed = true;
                }
                self.record(line, status);
            }
            ControlEvent::Skip { note } => {
                if !self.skipped {
                    self.skipped = true;
                    self.skip_note = note;
                }
            }
            ControlEvent::Exit { status } => self.close_unfinished(Some(status)),
        }
    }

    /// Finishes the run, given the status of the shell process (`None` if it was killed after a
    /// timeout).
    pub fn finish(mut self, process_status: Option<i32>) -> InterceptedRun {
        self.close_unfinished(process_status);
        if !self.started.contains(&Phase::Body) {
            // The shell exited before the test started, e.g. while running the script's top
            // level.
            if let Some(status) = process_status.filter(|status| *status != 0) {
                if self.failures.is_empty() {
                    self.record(self.lines.body, status);
                }
            }
        }
        if !self.finished.contains(&Phase::Body) {
            warn!(
                "test body at {}:{} did not run to completion",
                self.source.path(),
                self.lines.body
            );
        }
        InterceptedRun {
            body_finished: self.finished.contains(&Phase::Body),
            failures: self.failures,
            skipped: self.skipped,
            skip_note: self.skip_note,
        }
    }

    // ---
    // Helper methods
    // ---

    /// Attributes a phase that never reached its end to its last step.
    fn close_unfinished(&mut self, status: Option<i32>) {
        let Some(open) = self.open.take() else {
            return;
        };
        let line = open.last_step.unwrap_or(self.lines.line_for(open.phase));
        match status {
            Some(0) => debug!(
                "{} phase exited with status 0 at line {line}, not treating as a failure",
                open.phase
            ),
            Some(status) if !open.failed => self.record(line, status),
            Some(_) => {}
            None => debug!("{} phase was interrupted at line {line}", open.phase),
        }
    }

    fn record(&mut self, line: usize, status: i32) {
        let Some(text) = self.source.line_text(line) else {
            debug!(
                "discarding failure at line {line}: {} has {} lines",
                self.source.path(),
                self.source.line_count()
            );
            return;
        };
        self.failures.push(FailureRecord {
            file: self.source.path().to_owned(),
            line,
            status,
            command: text.trim().to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const SCRIPT: &str = indoc! {"
        setup() {
            mkdir -p /tmp/x
        }
        testcase_a() {
            true
            false
            return 4
        }
        testcase_nested() {
            if true; then
                false
                echo done
            fi
            for i in 1 2; do
                check \"$i\"
            done
        }
        check() {
            [ \"$1\" -gt 5 ]
        }
    "};

    fn source() -> ScriptSource {
        ScriptSource::new("t.sh", SCRIPT)
    }

    const LINES: PhaseLines = PhaseLines {
        setup: Some(1),
        body: 4,
        teardown: None,
    };

    fn record(line: usize, status: i32, command: &str) -> FailureRecord {
        FailureRecord {
            file: "t.sh".into(),
            line,
            status,
            command: command.to_owned(),
        }
    }

    #[test_case("phase-start body", Some(ControlEvent::PhaseStart(Phase::Body)); "phase start")]
    #[test_case("phase-end teardown 3", Some(ControlEvent::PhaseEnd { phase: Phase::Teardown, status: 3 }); "phase end")]
    #[test_case("step 12", Some(ControlEvent::Step { line: 12 }); "step")]
    #[test_case("fail 12 127", Some(ControlEvent::Fail { line: 12, status: 127 }); "fail")]
    #[test_case("err 3 2", Some(ControlEvent::CommandFail { line: 3, status: 2 }); "err")]
    #[test_case("err 3", None; "err without status")]
    #[test_case("skip", Some(ControlEvent::Skip { note: None }); "skip without note")]
    #[test_case("skip not  ready", Some(ControlEvent::Skip { note: Some("not  ready".to_owned()) }); "skip note keeps spacing")]
    #[test_case("exit 0", Some(ControlEvent::Exit { status: 0 }); "exit")]
    #[test_case("phase-start lunch", None; "unknown phase")]
    #[test_case("fail x 1", None; "bad line")]
    #[test_case("hello", None; "unknown event")]
    fn parse_event(line: &str, expected: Option<ControlEvent>) {
        assert_eq!(ControlEvent::parse(line), expected);
    }

    #[test]
    fn failing_steps_are_recorded_in_order() {
        let source = source();
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events(indoc! {"
            phase-start setup
            step 2
            phase-end setup 0
            phase-start body
            step 5
            step 6
            fail 6 1
            step 7
            fail 7 4
            phase-end body 4
            exit 0
            phase-start teardown
            phase-end teardown 0
        "});
        let run = interceptor.finish(Some(0));
        assert_eq!(
            run.failures,
            vec![record(6, 1, "false"), record(7, 4, "return 4")]
        );
        assert!(run.body_finished);
        assert!(!run.skipped);
    }

    #[test]
    fn phase_returning_non_zero_without_a_failing_step() {
        let source = source();
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events("phase-start body\nstep 5\nstep 7\nphase-end body 4\n");
        let run = interceptor.finish(Some(0));
        assert_eq!(run.failures, vec![record(7, 4, "return 4")]);
    }

    #[test]
    fn exit_inside_body() {
        let source = source();
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events(indoc! {"
            phase-start body
            step 5
            step 6
            exit 3
            phase-start teardown
            phase-end teardown 0
        "});
        let run = interceptor.finish(Some(3));
        assert_eq!(run.failures, vec![record(6, 3, "false")]);
        assert!(!run.body_finished);

        // Exiting with status 0 is not a failure.
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events("phase-start body\nstep 5\nexit 0\n");
        assert_eq!(interceptor.finish(Some(0)).failures, vec![]);
    }

    #[test]
    fn killed_process() {
        let source = source();

        // Killed by a signal: the status is attributed to the last step.
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events("phase-start setup\n");
        assert_eq!(
            interceptor.finish(Some(137)).failures,
            vec![record(1, 137, "setup() {")]
        );

        // Timed out: nothing is recorded here, the runner marks the timeout.
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events("phase-start body\nstep 5\n");
        assert_eq!(interceptor.finish(None).failures, vec![]);
    }

    #[test]
    fn exit_before_any_phase() {
        let source = source();
        let interceptor = FailureInterceptor::new(&source, LINES);
        assert_eq!(
            interceptor.finish(Some(2)).failures,
            vec![record(4, 2, "testcase_a() {")]
        );
    }

    #[test]
    fn skip_keeps_first_note_and_failures() {
        let source = source();
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events(indoc! {"
            phase-start body
            skip first reason
            step 6
            fail 6 1
            skip second reason
            phase-end body 0
        "});
        let run = interceptor.finish(Some(0));
        assert!(run.skipped);
        assert_eq!(run.skip_note.as_deref(), Some("first reason"));
        assert_eq!(run.failures.len(), 1);
    }

    #[test]
    fn failures_inside_compound_statements() {
        let source = source();
        let lines = PhaseLines {
            setup: None,
            body: 9,
            teardown: None,
        };
        let mut interceptor = FailureInterceptor::new(&source, lines);
        // The `if` step itself returns 0, so only the trap reports the inner failure. Each call to
        // the helper fails inside it and at the call site.
        interceptor.handle_events(indoc! {"
            phase-start body
            step 10
            err 11 1
            step 14
            err 19 1
            err 15 1
            err 19 1
            err 15 1
            fail 14 1
            phase-end body 1
        "});
        let run = interceptor.finish(Some(0));
        assert_eq!(
            run.failures,
            vec![
                record(11, 1, "false"),
                record(19, 1, r#"[ "$1" -gt 5 ]"#),
                record(15, 1, r#"check "$i""#),
                record(19, 1, r#"[ "$1" -gt 5 ]"#),
                record(15, 1, r#"check "$i""#),
            ]
        );
    }

    #[test]
    fn failing_step_is_recorded_once() {
        let source = source();
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        // A command substitution fails in a subshell and then as part of the step.
        interceptor.handle_events(indoc! {"
            phase-start body
            step 6
            err 6 1
            err 6 1
            fail 6 1
            step 7
            err 7 4
            fail 7 4
            phase-end body 4
        "});
        let run = interceptor.finish(Some(0));
        assert_eq!(
            run.failures,
            vec![record(6, 1, "false"), record(7, 4, "return 4")]
        );
    }

    #[test]
    fn out_of_range_lines_are_discarded() {
        let source = source();
        let mut interceptor = FailureInterceptor::new(&source, LINES);
        interceptor.handle_events(
            "phase-start body\nfail 0 1\nfail 99 1\nerr 99 2\nphase-end body 0\n",
        );
        assert_eq!(interceptor.finish(Some(0)).failures, vec![]);
    }
}
