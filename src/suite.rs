//! The test suite: a whole configuration file parsed into numbered test cases.
//!
//! # File layout
//!
//! ```text
//! % globals
//! {'datadir': 'data'}
//! %%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
//! First test title
//! % source
//! cases/first.txt
//! %%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
//! Second test title
//! ...
//! ```
//!
//! Blocks are separated by lines made only of `%`. Blank lines are dropped, and
//! a block needs at least one line besides its first to count. An optional
//! globals block, recognized only in first position, supplies suite defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::NamedSource;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::backend::Backend;
use crate::descriptor::{BlockContext, Harness, Tally, TestCase};
use crate::directive::Payload;
use crate::errors::{ConfigError, HarnessError, SourceArc};
use crate::lines::{Line, Lines};
use crate::paths::normalize_path;
use crate::report::ReportSink;
use crate::settings::SuiteSettings;

static DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^%+$").expect("valid regex"));
static GLOBALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^%\s*globals$").expect("valid regex"));

/// All tests of one configuration file, in file order.
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub conf_file: PathBuf,
    pub conf_dir: PathBuf,
    pub settings: SuiteSettings,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Read and parse the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(HarnessError::MissingConfig {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(Self::parse(&text, path)?)
    }

    /// Parse configuration `text` as if read from `conf_file`.
    pub fn parse(text: &str, conf_file: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let conf_file = normalize_path(conf_file);
        let conf_dir = conf_file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let src: SourceArc = Arc::new(NamedSource::new(
            conf_file.display().to_string(),
            text.to_string(),
        ));

        let mut settings = SuiteSettings::new(&conf_dir);
        let mut tests = Vec::new();
        let mut lines = Lines::from_text(text);
        let mut first = true;

        while !lines.at_end() {
            let block: Vec<Line> = lines
                .read_until(&DELIMITER)
                .into_iter()
                .filter(|l| !l.is_blank())
                .collect();
            if block.len() <= 1 {
                continue;
            }

            if first && GLOBALS.is_match(&block[0].text) {
                let payload = Payload::new("globals", &block[0], &block[1..], &src);
                settings.apply_globals(&payload, &conf_dir)?;
            } else {
                let ctx = BlockContext {
                    src: &src,
                    conf_dir: &conf_dir,
                    settings: &settings,
                };
                let number = tests.len() + 1;
                tests.push(TestCase::parse(block[1..].to_vec(), number, &ctx)?);
            }
            first = false;
        }

        debug!("parsed {} tests from {}", tests.len(), conf_file.display());
        Ok(Self {
            conf_file,
            conf_dir,
            settings,
            tests,
        })
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// The test with 1-based `number`.
    pub fn get(&self, number: usize) -> Option<&TestCase> {
        number.checked_sub(1).and_then(|i| self.tests.get(i))
    }

    /// Checks a requested test number against the suite.
    pub fn check_number(&self, number: i64) -> Result<usize, HarnessError> {
        usize::try_from(number)
            .ok()
            .filter(|n| self.get(*n).is_some())
            .ok_or(HarnessError::NumberOutOfRange {
                number,
                count: self.len(),
            })
    }

    /// Print every test as `N: title`, disabled tests marked with `!`.
    pub fn list(&self, sink: &mut dyn ReportSink) {
        for test in &self.tests {
            let marker = if test.disabled { "!" } else { "" };
            sink.line(&format!("{}: {}{}", test.number, marker, test.title));
        }
    }

    /// Tests selected by `number`. Disabled tests only run when asked for by number.
    fn selected(&self, number: Option<usize>) -> impl Iterator<Item = &TestCase> {
        self.tests.iter().filter(move |test| match number {
            Some(n) => test.number == n,
            None => !test.disabled,
        })
    }

    /// Run the selected tests and print totals for non-empty categories.
    pub fn run(
        &self,
        h: &mut Harness<'_>,
        number: Option<usize>,
        backend: Option<Backend>,
    ) -> Result<Tally, HarnessError> {
        let mut total = Tally::default();
        for test in self.selected(number) {
            if backend.is_some_and(|b| !test.backends.contains(&b)) {
                continue;
            }
            total += test.run(h, backend)?.tally();
        }
        if total.passed > 0 {
            h.sink.line(&format!("TOTAL PASSED:  {}", total.passed));
        }
        if total.failed > 0 {
            h.sink.line(&format!("TOTAL FAILED:  {}", total.failed));
        }
        if total.skipped > 0 {
            h.sink.line(&format!("TOTAL SKIPPED: {}", total.skipped));
        }
        Ok(total)
    }

    /// Regenerate golden files of the selected tests. Returns the files written.
    pub fn update(
        &self,
        h: &mut Harness<'_>,
        number: Option<usize>,
        backend: Option<Backend>,
        force: bool,
    ) -> Result<Vec<PathBuf>, HarnessError> {
        let mut written = Vec::new();
        for test in self.selected(number) {
            written.extend(test.update(h, backend, force)?);
        }
        Ok(written)
    }
}
