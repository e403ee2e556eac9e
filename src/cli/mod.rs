//! The Conform Command-Line Interface.
//!
//! Parses arguments, sets up logging and output, loads the suite and
//! dispatches to `list`, `run` or `update`.

use std::process;

use clap::Parser;
use termcolor::ColorChoice;
use tracing_subscriber::EnvFilter;

use crate::backend::{Backend, DEFAULT_BACKENDS};
use crate::cli::args::{ColorWhen, Command, ConformArgs, Targets};
use crate::converter::CommandConverter;
use crate::descriptor::Harness;
use crate::errors::HarnessError;
use crate::mtime::FsModTimes;
use crate::report::ConsoleSink;
use crate::suite::TestSuite;

pub mod args;

/// The main entry point for the CLI.
pub fn run() {
    let args = ConformArgs::parse();
    init_logging(args.verbose);

    match execute(&args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(1);
        }
    }
}

/// Runs the parsed command and returns the process exit code.
pub fn execute(args: &ConformArgs) -> Result<i32, HarnessError> {
    let suite = TestSuite::load(&args.conf_file)?;
    let converter = CommandConverter::new(args.converter.clone());
    let mtimes = FsModTimes;
    let mut sink = ConsoleSink::new(color_choice(args.color));

    match &args.command {
        Command::List => {
            suite.list(&mut sink);
            Ok(0)
        }
        Command::Run { targets } => {
            let (number, backend) = resolve_targets(&suite, targets)?;
            let mut harness = Harness::new(&converter, &mtimes, &mut sink);
            let tally = suite.run(&mut harness, number, backend)?;
            Ok(if tally.has_failures() { 1 } else { 0 })
        }
        Command::Update { targets, force } => {
            let (number, backend) = resolve_targets(&suite, targets)?;
            let mut harness = Harness::new(&converter, &mtimes, &mut sink);
            suite.update(&mut harness, number, backend, *force)?;
            Ok(0)
        }
    }
}

/// Validates positional NUMBER/BACKEND arguments against the suite.
///
/// Only the default backends can be selected here, even though a
/// configuration file may list others.
fn resolve_targets(
    suite: &TestSuite,
    args: &[String],
) -> Result<(Option<usize>, Option<Backend>), HarnessError> {
    let targets = Targets::classify(args);
    let backend = targets
        .backend
        .map(|name| match name.parse::<Backend>() {
            Ok(backend) if DEFAULT_BACKENDS.contains(&backend) => Ok(backend),
            _ => Err(HarnessError::UnknownBackend { name }),
        })
        .transpose()?;
    let number = targets
        .number
        .map(|n| suite.check_number(n))
        .transpose()?;
    Ok((number, backend))
}

fn color_choice(when: ColorWhen) -> ColorChoice {
    match when {
        ColorWhen::Auto => ColorChoice::Auto,
        ColorWhen::Always => ColorChoice::Always,
        ColorWhen::Never => ColorChoice::Never,
    }
}

/// Logs go to stderr. `RUST_LOG` overrides the `-v` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("conform={}", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}
