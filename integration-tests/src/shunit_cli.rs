// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use std::{
    borrow::Cow,
    collections::HashMap,
    ffi::OsString,
    fmt,
    process::{Command, ExitStatus},
};

/// Returns the path to a script in the `fixtures` directory.
pub fn fixture_path(name: &str) -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

/// A builder for a shunit invocation.
#[derive(Clone, Debug)]
pub struct ShunitCli {
    bin: Utf8PathBuf,
    args: Vec<String>,
    envs: HashMap<OsString, OsString>,
    current_dir: Option<Utf8PathBuf>,
}

impl ShunitCli {
    /// Creates a new invocation of the shunit binary at `bin`.
    ///
    /// Colors are disabled, and `SHUNIT_LOG` and `SHUNIT_VERBOSE` are cleared so the output doesn't
    /// depend on the environment the tests run in.
    pub fn new(bin: impl Into<Utf8PathBuf>) -> Self {
        let envs = [
            ("SHUNIT_COLOR", "never"),
            ("SHUNIT_LOG", ""),
            ("SHUNIT_VERBOSE", "false"),
        ]
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
        Self {
            bin: bin.into(),
            args: Vec::new(),
            envs,
            current_dir: None,
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(&mut self, arg: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(arg.into_iter().map(Into::into));
        self
    }

    pub fn env(&mut self, k: impl Into<OsString>, v: impl Into<OsString>) -> &mut Self {
        self.envs.insert(k.into(), v.into());
        self
    }

    /// Runs shunit in `dir` (by default, the current directory).
    pub fn current_dir(&mut self, dir: impl Into<Utf8PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Runs shunit to completion. A non-zero exit code is not an error.
    pub fn output(&self) -> ShunitOutput {
        let mut command = Command::new(&self.bin);
        command.args(&self.args);
        command.envs(&self.envs);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        let output = command.output().expect("failed to execute shunit");

        ShunitOutput {
            command,
            exit_status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

pub struct ShunitOutput {
    pub command: Command,
    pub exit_status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ShunitOutput {
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status.code()
    }

    pub fn stdout_as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

impl fmt::Display for ShunitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "command: {:?}\nexit code: {:?}\n\
                   --- stdout ---\n{}\n\n--- stderr ---\n{}\n\n",
            self.command,
            self.exit_status.code(),
            String::from_utf8_lossy(&self.stdout),
            String::from_utf8_lossy(&self.stderr)
        )
    }
}

// Make Debug output the same as Display output, so `.unwrap()` and `.expect()` are nicer.
impl fmt::Debug for ShunitOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
