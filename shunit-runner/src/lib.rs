// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [shunit](https://crates.io/crates/shunit), a minimal unit-test harness
//! for shell scripts.
//!
//! The basic flow of operations is:
//!
//! 1. [`script::ParsedScript`] reads a test script and splits it into functions and steps.
//! 2. [`list::TestList`] discovers the `testcase_*` functions and their descriptions.
//! 3. [`test_filter::TestFilter`] resolves user-supplied specs into the tests to run.
//! 4. [`runner::TestRunner`] runs each selected test in its own shell process, and
//!    [`reporter::TestReporter`] prints the results as they come in.

pub mod capture;
pub mod config;
pub mod errors;
pub mod exit_codes;
pub mod helpers;
pub mod list;
pub mod reporter;
pub mod runner;
pub mod script;
pub mod test_filter;
