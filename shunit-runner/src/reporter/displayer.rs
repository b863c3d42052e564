// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints out test results as they come in.
//!
//! The main structure in this module is [`TestReporter`].

use super::events::TestEvent;
use crate::{
    errors::WriteEventError,
    helpers::plural,
    list::TestCase,
    runner::{RunStats, TestOutcome, TestRun},
};
use owo_colors::{OwoColorize, Style};
use std::{
    error::Error,
    io::{self, Write},
};
use tracing::debug;

/// Where the reporter writes to.
///
/// This is usually standard output, but can be an in-memory buffer for tests.
pub enum ReporterOutput<'a> {
    /// Write to standard output.
    Stdout,

    /// Write to a buffer.
    Buffer(&'a mut Vec<u8>),
}

/// Test reporter builder.
#[derive(Debug, Default)]
pub struct TestReporterBuilder {
    should_colorize: bool,
    verbose: bool,
}

impl TestReporterBuilder {
    /// Set to true if the reporter should colorize output.
    pub fn set_colorize(&mut self, should_colorize: bool) -> &mut Self {
        self.should_colorize = should_colorize;
        self
    }

    /// Sets verbose output: the captured output of failed tests is shown beneath their failures.
    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.verbose = verbose;
        self
    }

    /// Creates a new test reporter.
    pub fn build<'a>(&self, output: ReporterOutput<'a>) -> TestReporter<'a> {
        let mut styles = Box::<Styles>::default();
        if self.should_colorize {
            styles.colorize();
        }
        TestReporter {
            output,
            styles,
            verbose: self.verbose,
        }
    }
}

/// Functionality to report test results to standard output.
pub struct TestReporter<'a> {
    output: ReporterOutput<'a>,
    styles: Box<Styles>,
    verbose: bool,
}

impl<'a> TestReporter<'a> {
    /// Report a test event.
    pub fn report_event(&mut self, event: TestEvent<'a>) -> Result<(), WriteEventError> {
        match &mut self.output {
            ReporterOutput::Stdout => {
                let mut writer = io::stdout().lock();
                write_event(&self.styles, self.verbose, event, &mut writer)?;
                writer.flush().map_err(WriteEventError::Io)
            }
            ReporterOutput::Buffer(buf) => write_event(&self.styles, self.verbose, event, buf),
        }
    }
}

fn write_event(
    styles: &Styles,
    verbose: bool,
    event: TestEvent<'_>,
    writer: &mut dyn Write,
) -> Result<(), WriteEventError> {
    match event {
        TestEvent::RunStarted {
            test_list,
            run_count,
        } => {
            debug!(
                "running {run_count} of {} {} from {}",
                test_list.len(),
                plural::tests_str(test_list.len()),
                test_list.path(),
            );
            Ok(())
        }
        TestEvent::TestStarted { .. } => Ok(()),
        TestEvent::TestFinished { test, run } => {
            write_finished(styles, verbose, test, &run, writer).map_err(WriteEventError::Io)
        }
        TestEvent::RunFinished { run_stats, .. } => {
            write_summary(styles, &run_stats, writer).map_err(WriteEventError::Io)
        }
    }
}

fn write_finished(
    styles: &Styles,
    verbose: bool,
    test: &TestCase,
    run: &TestRun,
    writer: &mut dyn Write,
) -> io::Result<()> {
    match run.outcome {
        TestOutcome::Passed => {
            writeln!(writer, " {} {}", "✓".style(styles.pass), test.description())
        }
        TestOutcome::Skipped => {
            write!(writer, " {} {} ", "-".style(styles.skip), test.description())?;
            match &run.skip_note {
                Some(note) => writeln!(writer, "({}: {note})", "skipped".style(styles.skip)),
                None => writeln!(writer, "({})", "skipped".style(styles.skip)),
            }
        }
        TestOutcome::Failed => {
            writeln!(writer, " {} {}", "✗".style(styles.fail), test.description())?;
            for failure in &run.failures {
                writeln!(
                    writer,
                    "   (in test file {}, line {})",
                    failure.file,
                    failure.line.style(styles.count),
                )?;
                writeln!(
                    writer,
                    "     `{}' failed with {}",
                    failure.command,
                    failure.status.style(styles.fail),
                )?;
            }
            if let Some(timeout) = run.timed_out {
                writeln!(
                    writer,
                    "   ({} after {})",
                    "timed out".style(styles.fail),
                    humantime::format_duration(timeout),
                )?;
            }
            if let Some(error) = &run.exec_error {
                write!(writer, "   (failed to execute test: {error}")?;
                let mut source = error.source();
                while let Some(err) = source {
                    write!(writer, ": {err}")?;
                    source = err.source();
                }
                writeln!(writer, ")")?;
            }
            if verbose {
                for line in run.output.lines() {
                    writeln!(writer, "       {}", line.style(styles.fail_output))?;
                }
            }
            Ok(())
        }
    }
}

fn write_summary(styles: &Styles, run_stats: &RunStats, writer: &mut dyn Write) -> io::Result<()> {
    writeln!(writer)?;
    write!(
        writer,
        "{} {}, {} {}",
        run_stats.final_run_count.style(styles.count),
        plural::tests_str(run_stats.final_run_count),
        run_stats.failed.style(styles.count),
        plural::failures_str(run_stats.failed),
    )?;
    if run_stats.skipped > 0 {
        write!(
            writer,
            ", {} {}",
            run_stats.skipped.style(styles.count),
            "skipped".style(styles.skip),
        )?;
    }
    writeln!(writer)
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    fail_output: Style,
    skip: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.fail_output = Style::new().magenta();
        self.skip = Style::new().yellow().bold();
    }
}
