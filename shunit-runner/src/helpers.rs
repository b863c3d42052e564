// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small helpers shared across shunit.

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    use std::borrow::Cow;

    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "failure" if `count` is 1, otherwise "failures".
    pub fn failures_str(count: usize) -> &'static str {
        if count == 1 { "failure" } else { "failures" }
    }

    /// Pluralizes an arbitrary English noun by count.
    ///
    /// A count of 1 returns the noun unchanged. Any other count appends "es" to nouns ending in
    /// "s", and "s" to everything else.
    pub fn pluralize(count: usize, noun: &str) -> Cow<'_, str> {
        if count == 1 {
            Cow::Borrowed(noun)
        } else if noun.ends_with('s') {
            Cow::Owned(format!("{noun}es"))
        } else {
            Cow::Owned(format!("{noun}s"))
        }
    }
}

/// Returns the exit status of a process as a shell would report it: the exit code, or 128 plus
/// the signal number if the process was killed by a signal.
pub(crate) fn shell_exit_status(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    // Not reachable on Unix: a process either exits or is signaled.
    1
}
