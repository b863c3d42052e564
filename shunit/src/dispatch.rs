// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, Result,
    output::{OutputContext, OutputOpts},
};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use shunit_runner::{
    capture::CapturedCommand,
    config::{DiscoveryOrder, ShunitConfig},
    errors::DiscoveryOrderParseError,
    exit_codes::ShunitExitCode,
    list::TestList,
    reporter::{ReporterOutput, TestReporterBuilder},
    runner::{ShellExecutor, TestRunnerBuilder},
    script::{ParsedScript, ScriptSource},
    test_filter::TestFilterBuilder,
};
use std::{
    ffi::OsString,
    io::{self, Write},
    time::Duration,
};

/// Parses the command line and runs shunit, then exits the process.
pub fn main_impl() -> ! {
    match ShunitApp::try_parse() {
        Ok(app) => {
            let output = app.init_output();
            match app.exec(output) {
                Ok(code) => std::process::exit(code),
                Err(error) => {
                    error.display_to_stderr(&output.stderr_styles());
                    std::process::exit(error.process_exit_code())
                }
            }
        }
        Err(err) => {
            // Help and version requests print to stdout and aren't errors.
            let code = if err.use_stderr() {
                ShunitExitCode::USAGE_ERROR
            } else {
                ShunitExitCode::OK
            };
            // Nothing more can be reported if printing fails.
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

/// A minimal unit-test harness for shell scripts.
///
/// Runs every `testcase_*` function defined in SCRIPT, each in a fresh shell, and reports which
/// ones passed, failed or were skipped. The exit code is the number of failed tests.
///
/// A script can also run itself by starting with `#!/usr/bin/env shunit`.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct ShunitApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    subcommand: Option<PrivateCommand>,

    #[clap(flatten)]
    run: RunOpts,
}

impl ShunitApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        match &self.subcommand {
            // The capture helper's stderr ends up in test output.
            Some(PrivateCommand::Capture(_)) => OutputContext::color_never_init(),
            None => self.output.init(),
        }
    }

    /// Executes the app.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        match self.subcommand {
            Some(PrivateCommand::Capture(opts)) => opts.exec(),
            None => self.run.exec(output),
        }
    }
}

#[derive(Debug, Subcommand)]
enum PrivateCommand {
    /// Private command, used by the in-test `run` function to capture a command's output.
    #[command(name = "__capture", hide = true)]
    Capture(CaptureOpts),
}

#[derive(Debug, Args)]
struct RunOpts {
    /// The test script to run
    #[arg(value_name = "SCRIPT", required = true)]
    script: Option<Utf8PathBuf>,

    /// Tests to run: an index, a test identifier, or a description pattern
    ///
    /// Identifiers and descriptions may contain `*` and `?` wildcards; descriptions match
    /// case-insensitively. With no specs, every test is run.
    #[arg(value_name = "SPECS")]
    specs: Vec<String>,

    /// List selected tests instead of running them
    #[arg(long, short)]
    list_tests: bool,

    /// Run tests even if they call `skip`
    #[arg(long, short)]
    force_run: bool,

    /// Config file [default: .config/shunit.toml in the current directory]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Order to discover and run tests in
    #[arg(long, value_name = "ORDER", value_parser = parse_order)]
    order: Option<DiscoveryOrder>,

    /// Allow more than one definition of a test (the last one wins)
    #[arg(long)]
    no_check_duplicates: bool,

    /// Shell to run tests with
    #[arg(long, value_name = "SHELL")]
    shell: Option<String>,

    /// Kill tests that run for longer than this, e.g. `30s` or `2m`
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
}

fn parse_order(input: &str) -> std::result::Result<DiscoveryOrder, String> {
    input
        .parse()
        .map_err(|err: DiscoveryOrderParseError| err.to_string())
}

impl RunOpts {
    fn exec(self, output: OutputContext) -> Result<i32> {
        let Some(script) = self.script else {
            unreachable!("clap requires SCRIPT unless a subcommand is given");
        };

        let config = ShunitConfig::from_sources(".", self.config_file.as_deref())?;
        let mut discovery = config.discovery().clone();
        if let Some(order) = self.order {
            discovery.order = order;
        }
        if self.no_check_duplicates {
            discovery.check_duplicates = false;
        }
        let mut run_config = config.run().clone();
        if let Some(shell) = self.shell {
            run_config.shell = shell;
        }
        if let Some(timeout) = self.timeout {
            run_config.timeout = Some(timeout);
        }
        let force_run = self.force_run || run_config.force_run;

        let source = ScriptSource::from_path(script)?;
        let parsed = ParsedScript::parse(source)?;
        let test_list = TestList::new(parsed, &discovery)?;

        let filter = TestFilterBuilder::new(&self.specs)?.build(&test_list)?;

        if self.list_tests {
            let colorize = output.color.should_colorize(supports_color::Stream::Stdout);
            test_list
                .write(&filter.to_vec(), io::stdout().lock(), colorize)
                .map_err(|err| ExpectedError::WriteTestListError { err })?;
            return Ok(ShunitExitCode::OK);
        }

        let capture_program =
            std::env::current_exe().map_err(|err| ExpectedError::CurrentExeFailed { err })?;
        let executor = ShellExecutor::new(&run_config, capture_program);
        let runner = TestRunnerBuilder::default()
            .set_force_run(force_run)
            .build(&test_list, &filter, executor);

        let mut reporter = TestReporterBuilder::default()
            .set_colorize(output.color.should_colorize(supports_color::Stream::Stdout))
            .set_verbose(output.verbose)
            .build(ReporterOutput::Stdout);
        let run_stats = runner.try_execute(|event| reporter.report_event(event))?;

        Ok(ShunitExitCode::from_failure_count(run_stats.failed))
    }
}

#[derive(Debug, Args)]
struct CaptureOpts {
    /// The command to run, and its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<OsString>,
}

impl CaptureOpts {
    fn exec(self) -> Result<i32> {
        let captured = match self.command.split_first() {
            Some((program, args)) => {
                CapturedCommand::run(program, args).unwrap_or_else(|error| {
                    // Reported like a shell would, to the test's output.
                    eprintln!("{error}");
                    CapturedCommand::from_error(&error)
                })
            }
            None => CapturedCommand::default(),
        };

        let mut stdout = io::stdout().lock();
        stdout
            .write_all(captured.to_shell_assignments().as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|err| ExpectedError::WriteCaptureError { err })?;
        Ok(ShunitExitCode::OK)
    }
}
