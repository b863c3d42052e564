// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs selected tests and categorizes their results.
//!
//! The main structure in this module is [`TestRunner`]. Each test is run by a [`TestExecutor`],
//! normally a [`ShellExecutor`].

mod imp;
mod interceptor;
mod shell;
mod skip;

pub use imp::*;
pub use interceptor::*;
pub use shell::*;
pub use skip::*;
