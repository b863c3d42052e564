// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    interceptor::{FailureInterceptor, FailureRecord, PhaseLines},
    skip::{SkipRewrite, rewrite_skip},
};
use crate::{
    errors::TestExecuteError,
    list::{TestCase, TestList},
    reporter::events::TestEvent,
    script::FunctionDef,
    test_filter::TestFilter,
};
use std::{
    convert::Infallible,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::debug;

/// Test runner options.
#[derive(Clone, Debug, Default)]
pub struct TestRunnerBuilder {
    force_run: bool,
}

impl TestRunnerBuilder {
    /// Sets whether skip directives are ignored.
    pub fn set_force_run(&mut self, force_run: bool) -> &mut Self {
        self.force_run = force_run;
        self
    }

    /// Creates a new test runner for the tests selected by `filter`.
    pub fn build<'list, E: TestExecutor>(
        &self,
        test_list: &'list TestList,
        filter: &TestFilter<'list>,
        executor: E,
    ) -> TestRunner<'list, E> {
        TestRunner {
            force_run: self.force_run,
            test_list,
            tests: filter.to_vec(),
            executor,
        }
    }
}

/// Context for running tests.
///
/// Tests run one at a time, in discovery order, each in a process of its own.
#[derive(Debug)]
pub struct TestRunner<'list, E> {
    force_run: bool,
    test_list: &'list TestList,
    tests: Vec<&'list TestCase>,
    executor: E,
}

impl<'list, E: TestExecutor> TestRunner<'list, E> {
    /// Executes the selected tests.
    ///
    /// The callback is called with the results of each test.
    pub fn execute<F>(&self, mut callback: F) -> RunStats
    where
        F: FnMut(TestEvent<'list>),
    {
        match self.try_execute::<Infallible, _>(|test_event| {
            callback(test_event);
            Ok(())
        }) {
            Ok(run_stats) => run_stats,
            Err(never) => match never {},
        }
    }

    /// Executes the selected tests.
    ///
    /// Accepts a callback that is called with the results of each test. If the callback returns an
    /// error, no further tests are run and the error is returned.
    pub fn try_execute<Err, F>(&self, mut callback: F) -> Result<RunStats, Err>
    where
        F: FnMut(TestEvent<'list>) -> Result<(), Err>,
    {
        let start_time = Instant::now();
        let mut run_stats = RunStats {
            initial_run_count: self.tests.len(),
            ..RunStats::default()
        };

        callback(TestEvent::RunStarted {
            test_list: self.test_list,
            run_count: self.tests.len(),
        })?;

        for &test in &self.tests {
            callback(TestEvent::TestStarted { test })?;
            let run = self.run_test(test);
            run_stats.on_test_finished(&run);
            callback(TestEvent::TestFinished { test, run })?;
        }

        callback(TestEvent::RunFinished {
            elapsed: start_time.elapsed(),
            run_stats,
        })?;
        Ok(run_stats)
    }

    // ---
    // Helper methods
    // ---

    /// Runs a single test through all of its phases and categorizes the result.
    fn run_test(&self, test: &'list TestCase) -> TestRun {
        let body = rewrite_skip(test.definition().steps(), self.force_run);
        if let Some(line) = body.skip_line {
            debug!("{}: body returns after skip at line {line}", test.name());
        }
        let plan = TestPlan {
            test_list: self.test_list,
            test,
            body,
            force_run: self.force_run,
        };

        let start_time = Instant::now();
        debug!("{}: executing", test.name());
        match self.executor.execute(&plan) {
            Ok(output) => self.post_process(test, output),
            Err(error) => {
                debug!("{}: failed to execute: {error}", test.name());
                TestRun {
                    outcome: TestOutcome::Failed,
                    skip_note: None,
                    failures: Vec::new(),
                    timed_out: None,
                    exec_error: Some(Arc::new(error)),
                    output: String::new(),
                    time_taken: start_time.elapsed(),
                }
            }
        }
    }

    fn post_process(&self, test: &TestCase, output: ExecutionOutput) -> TestRun {
        let lines = PhaseLines {
            setup: self.test_list.setup().map(FunctionDef::line),
            body: test.line(),
            teardown: self.test_list.teardown().map(FunctionDef::line),
        };
        let mut interceptor = FailureInterceptor::new(self.test_list.script().source(), lines);
        interceptor.handle_events(&output.events);

        let (status, timed_out) = match output.exit {
            ProcessExit::Exited(status) => (Some(status), None),
            ProcessExit::TimedOut(timeout) => (None, Some(timeout)),
        };
        let intercepted = interceptor.finish(status);
        let failed = !intercepted.failures.is_empty() || timed_out.is_some();
        let outcome = TestOutcome::categorize(intercepted.skipped, failed);
        debug!(
            "{}: {outcome} ({} failure records, status {status:?})",
            test.name(),
            intercepted.failures.len(),
        );

        TestRun {
            outcome,
            skip_note: intercepted.skip_note,
            failures: intercepted.failures,
            timed_out,
            exec_error: None,
            output: output.output,
            time_taken: output.time_taken,
        }
    }
}

/// Everything needed to run one test: the test, its fixtures, and the rewritten body.
#[derive(Clone, Debug)]
pub struct TestPlan<'a> {
    /// The list the test is in. Fixtures and the script source come from here.
    pub test_list: &'a TestList,

    /// The test to run.
    pub test: &'a TestCase,

    /// The body to run, with the skip rewrite applied.
    pub body: SkipRewrite,

    /// Whether skip directives are ignored.
    pub force_run: bool,
}

/// Runs a single [`TestPlan`].
pub trait TestExecutor {
    /// Executes the plan, returning the raw control events and output.
    ///
    /// An error means the test could not be run at all.
    fn execute(&self, plan: &TestPlan<'_>) -> Result<ExecutionOutput, TestExecuteError>;
}

/// The raw output of executing a [`TestPlan`].
#[derive(Clone, Debug)]
pub struct ExecutionOutput {
    /// The control events the test emitted, one per line.
    pub events: String,

    /// How the process ended.
    pub exit: ProcessExit,

    /// Combined stdout and stderr of the test.
    pub output: String,

    /// How long the test took.
    pub time_taken: Duration,
}

/// How a test process ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProcessExit {
    /// The process exited with this status (128 + signal number if it was killed by a signal).
    Exited(i32),

    /// The process was killed after running for longer than this timeout.
    TimedOut(Duration),
}

/// The outcome of a single test run.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestOutcome {
    /// No failures were recorded.
    Passed,

    /// At least one failure was recorded, the test timed out, or it couldn't be executed.
    Failed,

    /// The test called the skip directive.
    Skipped,
}

impl TestOutcome {
    /// Categorizes a run. Skipped takes precedence over failed, which takes precedence over
    /// passed.
    pub fn categorize(skipped: bool, failed: bool) -> Self {
        if skipped {
            TestOutcome::Skipped
        } else if failed {
            TestOutcome::Failed
        } else {
            TestOutcome::Passed
        }
    }

    /// Returns true if this outcome doesn't count as a failure.
    pub fn is_success(self) -> bool {
        match self {
            TestOutcome::Passed | TestOutcome::Skipped => true,
            TestOutcome::Failed => false,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => f.pad("passed"),
            TestOutcome::Failed => f.pad("failed"),
            TestOutcome::Skipped => f.pad("skipped"),
        }
    }
}

/// The result of running a single test.
#[derive(Clone, Debug)]
pub struct TestRun {
    /// The categorized outcome.
    pub outcome: TestOutcome,

    /// The reason passed to `skip`, if the test was skipped with one.
    pub skip_note: Option<String>,

    /// Failures in the order they happened.
    pub failures: Vec<FailureRecord>,

    /// Set if the test was killed after this timeout.
    pub timed_out: Option<Duration>,

    /// Set if the test couldn't be executed.
    pub exec_error: Option<Arc<TestExecuteError>>,

    /// Combined stdout and stderr of the test.
    pub output: String,

    /// How long the test took.
    pub time_taken: Duration,
}

/// Statistics for a test run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RunStats {
    /// The total number of tests that were expected to be run at the beginning.
    pub initial_run_count: usize,

    /// The total number of tests that were actually run.
    pub final_run_count: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The number of tests that were skipped.
    pub skipped: usize,
}

impl RunStats {
    /// Returns true if this run is considered a success.
    ///
    /// A run is marked as failed if any tests failed, or if it stopped before every test ran.
    pub fn is_success(&self) -> bool {
        self.initial_run_count == self.final_run_count && self.failed == 0
    }

    fn on_test_finished(&mut self, run: &TestRun) {
        self.final_run_count += 1;
        match run.outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed => self.failed += 1,
            TestOutcome::Skipped => self.skipped += 1,
        }
    }
}
