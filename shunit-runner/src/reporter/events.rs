// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Events emitted by the test runner.

use crate::{
    list::{TestCase, TestList},
    runner::{RunStats, TestRun},
};
use std::time::Duration;

/// A test event.
///
/// Events are produced by a [`TestRunner`](crate::runner::TestRunner) and consumed by a
/// [`TestReporter`](crate::reporter::TestReporter).
#[derive(Clone, Debug)]
pub enum TestEvent<'a> {
    /// The test run started.
    RunStarted {
        /// The list of tests the selected tests come from.
        test_list: &'a TestList,

        /// The number of tests that will be run.
        run_count: usize,
    },

    /// A test started running.
    TestStarted {
        /// The test that started.
        test: &'a TestCase,
    },

    /// A test finished running and its outcome was categorized.
    TestFinished {
        /// The test that finished.
        test: &'a TestCase,

        /// The result of the run.
        run: TestRun,
    },

    /// The test run finished.
    RunFinished {
        /// The amount of time it took for the tests to run.
        elapsed: Duration,

        /// Statistics for the run.
        run_stats: RunStats,
    },
}
