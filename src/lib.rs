pub use crate::descriptor::{Harness, Outcome, Tally, TestCase, TestRun};
pub use crate::errors::{ConfigError, ConvertError, HarnessError};
pub use crate::suite::TestSuite;

pub mod backend;
pub mod cli;
pub mod converter;
pub mod descriptor;
pub mod diff;
pub mod directive;
pub mod errors;
pub mod lines;
pub mod literal;
pub mod mtime;
pub mod paths;
pub mod report;
pub mod settings;
pub mod suite;
