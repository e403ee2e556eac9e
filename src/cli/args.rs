//! Defines the command-line arguments and subcommands for the Conform CLI.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "conform",
    version,
    about = "Run conformance tests for a text-to-markup converter against golden files."
)]
pub struct ConformArgs {
    /// Configuration file describing the tests.
    #[arg(
        short = 'f',
        long = "conf-file",
        env = "CONFORM_CONF_FILE",
        default_value = "conformance.conf",
        global = true
    )]
    pub conf_file: PathBuf,

    /// Converter executable used to generate output.
    #[arg(
        long,
        env = "CONFORM_CONVERTER",
        default_value = "asciidoc3",
        global = true
    )]
    pub converter: String,

    /// When to color status words.
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Raise the log level (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tests.
    List,
    /// Execute tests.
    Run {
        /// Optional test NUMBER and/or BACKEND, in either order.
        #[arg(num_args = 0..=2, allow_negative_numbers = true, value_name = "NUMBER|BACKEND")]
        targets: Vec<String>,
    },
    /// Regenerate and update golden test data.
    Update {
        /// Optional test NUMBER and/or BACKEND, in either order.
        #[arg(num_args = 0..=2, allow_negative_numbers = true, value_name = "NUMBER|BACKEND")]
        targets: Vec<String>,
        /// Update all test data, overwriting current files.
        #[arg(long)]
        force: bool,
    },
}

/// A test number and backend name picked out of positional arguments.
///
/// Arguments that parse as integers, signed or not, are numbers; anything
/// else names a backend. Later arguments win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    pub number: Option<i64>,
    pub backend: Option<String>,
}

impl Targets {
    pub fn classify(args: &[String]) -> Self {
        let mut targets = Targets::default();
        for arg in args.iter().take(2) {
            match arg.parse::<i64>() {
                Ok(n) => targets.number = Some(n),
                Err(_) => targets.backend = Some(arg.clone()),
            }
        }
        targets
    }
}
