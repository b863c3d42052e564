// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use owo_colors::OwoColorize;
use shunit_runner::{errors::*, exit_codes::ShunitExitCode};
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An error that shunit expects to happen, along with the exit code it maps to.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("script read error")]
    ScriptReadError {
        #[from]
        err: ScriptReadError,
    },
    #[error("script parse error")]
    ScriptParseError {
        #[from]
        err: ScriptParseError,
    },
    #[error("duplicate tests found")]
    DuplicateTestError {
        #[from]
        err: DuplicateTestError,
    },
    #[error("test filter build error")]
    TestFilterBuilderError {
        #[from]
        err: TestFilterBuilderError,
    },
    #[error("test selection error")]
    SelectionError {
        #[from]
        err: SelectionError,
    },
    #[error("failed to determine the path to shunit")]
    CurrentExeFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("error writing test list output")]
    WriteTestListError {
        #[source]
        err: std::io::Error,
    },
    #[error("error writing event")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
    #[error("error writing captured command")]
    WriteCaptureError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::ScriptReadError { .. }
            | Self::ScriptParseError { .. }
            | Self::CurrentExeFailed { .. } => ShunitExitCode::SETUP_ERROR,
            Self::DuplicateTestError { .. } => ShunitExitCode::DISCOVERY_FAILED,
            Self::TestFilterBuilderError { .. } => ShunitExitCode::USAGE_ERROR,
            Self::SelectionError { .. } => ShunitExitCode::SELECTION_FAILED,
            Self::WriteTestListError { .. }
            | Self::WriteEventError { .. }
            | Self::WriteCaptureError { .. } => ShunitExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse shunit config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::ScriptReadError { err } => {
                error!("failed to read test script `{}`", err.path().style(styles.bold));
                err.source()
            }
            Self::ScriptParseError { err } => {
                error!(target: NO_HEADING_TARGET, "{:?}", err.to_report());
                error!(
                    "failed to parse test script `{}` (line {})",
                    err.path().style(styles.bold),
                    err.line(),
                );
                None
            }
            Self::DuplicateTestError { err } => {
                error!("{err}");
                None
            }
            Self::TestFilterBuilderError { err } => {
                error!("{err}");
                err.source()
            }
            Self::SelectionError { err } => {
                error!("{err}");
                None
            }
            Self::CurrentExeFailed { err } => {
                error!("failed to determine the path to shunit");
                Some(err as &dyn Error)
            }
            Self::WriteTestListError { err } => {
                error!("failed to write test list to output");
                Some(err as &dyn Error)
            }
            Self::WriteEventError { err } => {
                error!("failed to write event to output");
                err.source()
            }
            Self::WriteCaptureError { err } => {
                error!("failed to write captured command to output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

