// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Documented exit codes for `shunit`.

/// Documented exit codes for `shunit` runs.
///
/// A run that completes reports its failure count as the exit code, so codes from 0 up to
/// [`MAX_FAILURES`](Self::MAX_FAILURES) mean "this many tests failed". Codes above that range
/// document failures in shunit itself.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum ShunitExitCode {}

impl ShunitExitCode {
    /// No errors occurred, and every selected test passed or was skipped.
    pub const OK: i32 = 0;

    /// The largest failure count that is reported as-is. Runs with more failures exit with this
    /// code.
    pub const MAX_FAILURES: i32 = 89;

    /// Discovery found more than one definition of a test identifier.
    pub const DISCOVERY_FAILED: i32 = 93;

    /// A test spec did not match any discovered test.
    pub const SELECTION_FAILED: i32 = 94;

    /// The command line could not be parsed.
    pub const USAGE_ERROR: i32 = 95;

    /// A user issue happened while setting up a shunit invocation: the config or the script could
    /// not be read or parsed.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// Returns the exit code for a completed run with `failed` failing tests.
    pub fn from_failure_count(failed: usize) -> i32 {
        i32::try_from(failed)
            .unwrap_or(Self::MAX_FAILURES)
            .min(Self::MAX_FAILURES)
    }
}
