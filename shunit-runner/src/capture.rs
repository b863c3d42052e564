// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Command Capture Helper behind the in-test `run` function.
//!
//! `run` calls back into shunit, which executes the command with stdout and stderr merged and
//! prints shell assignments for the `status`, `output` and `lines` slots. The test evaluates those
//! assignments, so the slots are visible to the rest of the test body.

use crate::{errors::CaptureError, helpers::shell_exit_status};
use std::{
    env,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};
use swrite::{SWrite, swrite};
use tracing::debug;

/// The result of running a command through `run`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CapturedCommand {
    /// The exit status, as the shell would report it in `$?`.
    pub status: i32,

    /// Combined stdout and stderr, with trailing newlines removed.
    pub output: String,

    /// `output` split into lines.
    pub lines: Vec<String>,
}

impl CapturedCommand {
    /// The status reported when a command cannot be found.
    pub const NOT_FOUND_STATUS: i32 = 1;

    /// The status reported when a command is found but cannot be started.
    pub const SPAWN_FAILED_STATUS: i32 = 126;

    /// Builds a captured result from raw combined output.
    pub fn new(status: i32, raw_output: &[u8]) -> Self {
        let output = String::from_utf8_lossy(raw_output)
            .trim_end_matches('\n')
            .to_owned();
        let lines = if output.is_empty() {
            Vec::new()
        } else {
            output.split('\n').map(str::to_owned).collect()
        };
        Self {
            status,
            output,
            lines,
        }
    }

    /// Returns the captured result that stands in for a command that couldn't be run.
    pub fn from_error(error: &CaptureError) -> Self {
        let status = match error {
            CaptureError::NotFound { .. } => Self::NOT_FOUND_STATUS,
            CaptureError::Spawn { .. } => Self::SPAWN_FAILED_STATUS,
        };
        Self {
            status,
            ..Self::default()
        }
    }

    /// Runs `program` with `args`, capturing its combined output.
    ///
    /// A program that exits non-zero is not an error: its status is recorded like any other.
    pub fn run<I>(program: &OsStr, args: I) -> Result<Self, CaptureError>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let path = resolve_program(program)?;
        debug!("capturing output of {}", path.display());
        let output = duct::cmd(path.as_path(), args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|err| CaptureError::Spawn {
                program: program.to_string_lossy().into_owned(),
                err,
            })?;
        Ok(Self::new(shell_exit_status(output.status), &output.stdout))
    }

    /// Returns bash assignments that set the `status`, `output` and `lines` slots.
    pub fn to_shell_assignments(&self) -> String {
        let mut out = String::new();
        swrite!(out, "status={}\n", self.status);
        swrite!(out, "output={}\n", shell_words::quote(&self.output));
        out.push_str("lines=(");
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            out.push_str(&shell_words::quote(line));
        }
        out.push_str(")\n");
        out
    }
}

/// Resolves `program` the way a shell would: names containing `/` are used as-is, and other names
/// are searched for on `PATH`.
pub fn resolve_program(program: &OsStr) -> Result<PathBuf, CaptureError> {
    let not_found = || CaptureError::NotFound {
        program: program.to_string_lossy().into_owned(),
    };

    if program.is_empty() {
        return Err(not_found());
    }
    if program.to_string_lossy().contains('/') {
        let path = PathBuf::from(program);
        return if is_executable(&path) {
            Ok(path)
        } else {
            Err(not_found())
        };
    }

    let search_path = env::var_os("PATH").unwrap_or_default();
    env::split_paths(&search_path)
        .map(|dir| {
            // An empty PATH entry means the current directory.
            if dir.as_os_str().is_empty() {
                PathBuf::from(".").join(program)
            } else {
                dir.join(program)
            }
        })
        .find(|candidate| is_executable(candidate))
        .ok_or_else(not_found)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
