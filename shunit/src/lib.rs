// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A minimal unit-test harness for shell scripts.
//!
//! shunit discovers the `testcase_*` functions in a shell script and runs each one in a fresh
//! shell, with the script's `setup` and `teardown` functions around it. Any command in a test
//! that returns non-zero is a failure: there is no assertion API.
//!
//! The core logic lives in [`shunit_runner`]. This crate contains the command-line interface.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{Color, OutputContext, StderrStyles};
