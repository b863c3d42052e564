// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by shunit.

use crate::{config::DiscoveryOrder, helpers::plural};
use camino::Utf8PathBuf;
use config::ConfigError;
use itertools::Itertools;
use miette::{Diagnostic, NamedSource, SourceSpan};
use smol_str::SmolStr;
use std::{fmt, io};
use swrite::{SWrite, swrite};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse shunit config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }
}

/// Error returned while parsing a [`DiscoveryOrder`](crate::config::DiscoveryOrder) value from a
/// string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for discovery order: {input}\n(known values: {})",
    DiscoveryOrder::variants().join(", "),
)]
pub struct DiscoveryOrderParseError {
    input: String,
}

impl DiscoveryOrderParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurred while reading a test script from disk.
#[derive(Debug, Error)]
#[error("failed to read test script `{path}`")]
pub struct ScriptReadError {
    path: Utf8PathBuf,
    #[source]
    err: io::Error,
}

impl ScriptReadError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, err: io::Error) -> Self {
        Self {
            path: path.into(),
            err,
        }
    }

    /// Returns the path that could not be read.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// A test script could not be split into statements.
#[derive(Clone, Debug, Error)]
#[error("failed to parse test script `{path}` (line {line})")]
pub struct ScriptParseError {
    path: Utf8PathBuf,
    input: String,
    line: usize,
    #[source]
    error: ScriptSyntaxError,
}

impl ScriptParseError {
    pub(crate) fn new(
        path: impl Into<Utf8PathBuf>,
        input: impl Into<String>,
        line: usize,
        error: ScriptSyntaxError,
    ) -> Self {
        Self {
            path: path.into(),
            input: input.into(),
            line,
            error,
        }
    }

    /// Returns the path of the script that failed to parse.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }

    /// Returns the 1-based line the offending construct starts on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Returns the underlying syntax error.
    pub fn syntax_error(&self) -> &ScriptSyntaxError {
        &self.error
    }

    /// Returns a [`miette::Report`] that renders the error against the script source.
    pub fn to_report(&self) -> miette::Report {
        miette::Report::new(self.error.clone())
            .with_source_code(NamedSource::new(self.path.as_str(), self.input.clone()))
    }
}

/// A single syntax error found while scanning shell text.
#[derive(Clone, Debug, Error, Diagnostic, PartialEq)]
#[non_exhaustive]
pub enum ScriptSyntaxError {
    /// A `'...'` or `$'...'` string was never closed.
    #[error("unterminated single-quoted string")]
    UnterminatedSingleQuote(#[label("string starts here")] SourceSpan),

    /// A `"..."` string was never closed.
    #[error("unterminated double-quoted string")]
    UnterminatedDoubleQuote(#[label("string starts here")] SourceSpan),

    /// A `` `...` `` command substitution was never closed.
    #[error("unterminated backquote substitution")]
    UnterminatedBackquote(#[label("substitution starts here")] SourceSpan),

    /// A `$(...)`, `${...}` or `$((...))` was never closed.
    #[error("unterminated substitution")]
    UnterminatedSubstitution(#[label("substitution starts here")] SourceSpan),

    /// A compound command was still open at the end of the input.
    #[error("`{keyword}` is never closed")]
    UnclosedCompound {
        /// The keyword (or brace) that opened the compound command.
        keyword: SmolStr,

        /// Where the compound command starts.
        #[label("opened here")]
        span: SourceSpan,
    },
}

/// More than one function in a script shares a test identifier.
#[derive(Clone, Debug, Error)]
#[error("{}", duplicates_message(.script, .duplicates))]
pub struct DuplicateTestError {
    script: Utf8PathBuf,
    duplicates: Vec<DuplicateTest>,
}

/// One test identifier that was defined more than once.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DuplicateTest {
    /// The test identifier.
    pub name: SmolStr,

    /// The 1-based lines of every definition, in order.
    pub lines: Vec<usize>,
}

impl DuplicateTestError {
    pub(crate) fn new(script: impl Into<Utf8PathBuf>, duplicates: Vec<DuplicateTest>) -> Self {
        Self {
            script: script.into(),
            duplicates,
        }
    }

    /// Returns the duplicated identifiers, in declaration order of their first definition.
    pub fn duplicates(&self) -> &[DuplicateTest] {
        &self.duplicates
    }
}

fn duplicates_message(script: &Utf8PathBuf, duplicates: &[DuplicateTest]) -> String {
    let mut message = format!(
        "found {} duplicate test {} in `{script}`:",
        duplicates.len(),
        plural::pluralize(duplicates.len(), "identifier"),
    );
    for dup in duplicates {
        swrite!(
            message,
            "\n  {} defined at {}",
            dup.name,
            dup.lines
                .iter()
                .map(|line| format!("{script}:{line}"))
                .join(", "),
        );
    }
    message
}

/// An error that occurred while building a [`TestFilter`](crate::test_filter::TestFilter).
#[derive(Clone, Debug, Error)]
#[error("invalid test spec `{spec}`")]
pub struct TestFilterBuilderError {
    spec: String,
    #[source]
    err: globset::Error,
}

impl TestFilterBuilderError {
    pub(crate) fn new(spec: impl Into<String>, err: globset::Error) -> Self {
        Self {
            spec: spec.into(),
            err,
        }
    }
}

/// A test spec did not resolve to any discovered test.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum SelectionError {
    /// A numeric spec was outside the discovered range.
    #[error("test index {index} is out of range ({})", IndexRange::new(.test_count))]
    IndexOutOfRange {
        /// The index as written by the user.
        index: String,

        /// The number of discovered tests.
        test_count: usize,
    },

    /// An identifier spec matched no discovered identifier.
    #[error("no test identifier matches `{spec}`")]
    NoIdentifierMatch {
        /// The spec as written by the user.
        spec: String,
    },

    /// A description spec matched no discovered description.
    #[error("no test description matches `{spec}`")]
    NoDescriptionMatch {
        /// The spec as written by the user.
        spec: String,
    },
}

struct IndexRange(usize);

impl IndexRange {
    fn new(test_count: &usize) -> Self {
        Self(*test_count)
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "no tests were discovered"),
            count => write!(f, "valid range: 0..={}", count - 1),
        }
    }
}

/// The Command Capture Helper could not run a command.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    /// The command could not be found on `PATH`, or the path given does not name an executable.
    #[error("{program}: command not found")]
    NotFound {
        /// The program as it was named.
        program: String,
    },

    /// The command was found but could not be started.
    #[error("{program}: failed to execute")]
    Spawn {
        /// The program as it was named.
        program: String,

        /// The underlying error.
        #[source]
        err: io::Error,
    },
}

/// A test could not be executed at all.
///
/// These are per-test failures: the run continues with the next test.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestExecuteError {
    /// The temporary directory for control events could not be created.
    #[error("failed to create temporary directory")]
    TempDir(#[source] io::Error),

    /// The generated test program could not be written.
    #[error("failed to write test program to `{path}`")]
    WriteProgram {
        /// The path the program was written to.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// The shell could not be spawned.
    #[error("failed to spawn `{shell}`")]
    Spawn {
        /// The shell that was spawned.
        shell: String,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// Waiting for the shell, or killing it after a timeout, failed.
    #[error("failed to wait for `{shell}`")]
    Wait {
        /// The shell that was waited for.
        shell: String,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// The control events or the captured output could not be read back.
    #[error("failed to read back test output from `{path}`")]
    ReadOutput {
        /// The file that could not be read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },
}

/// An error that occurs while writing an event.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing the event to the provided output.
    #[error("error writing to output")]
    Io(#[source] io::Error),
}
