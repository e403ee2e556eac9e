//! Test descriptors: one parsed configuration block and everything that can be
//! done with it.
//!
//! # Block layout
//!
//! ```text
//! Optional title line (a leading '!' disables the test)
//! Optional description lines
//! % source
//! cases/lists.txt
//! % options
//! ['--section-numbers', ('--attribute', 'toc')]
//! % attributes
//! {'footer-style': 'none'}
//! % backends
//! ('html5',)
//! % name
//! lists
//! ```
//!
//! # Lifecycle
//!
//! For each backend a descriptor owns one golden file. [`TestCase::run`]
//! classifies every backend in scope as passed, failed or skipped and returns
//! the classification; nothing is stored on the descriptor between runs.
//! [`TestCase::update`] regenerates golden files that are missing or older
//! than the source.

use std::fs;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::backend::Backend;
use crate::converter::{Attributes, ConvertRequest, Converter, ConverterOption};
use crate::diff::{report_failure, strip_trailing_blank, unified_diff};
use crate::directive::{Directive, Payload};
use crate::errors::{ConfigError, ConfigErrorKind, ConvertError, HarnessError, SourceArc};
use crate::lines::{Line, Lines};
use crate::mtime::ModTimes;
use crate::paths::{normalize_path, resolve};
use crate::report::{ReportSink, Status};
use crate::settings::SuiteSettings;

static DIRECTIVE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^%").expect("valid regex"));
static DIRECTIVE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%\s*(?P<directive>[\w_-]+)").expect("valid regex"));

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

// =============================================================================
// CORE TYPES
// =============================================================================

/// One test case parsed from a configuration block.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// 1-based position among the test blocks of the file.
    pub number: usize,
    /// Stem of the golden file names.
    pub name: String,
    pub title: String,
    pub description: Vec<String>,
    /// Converter input, relative paths resolved against the configuration directory.
    pub source: Option<PathBuf>,
    pub options: Vec<ConverterOption>,
    pub attributes: Attributes,
    pub backends: Vec<Backend>,
    pub datadir: PathBuf,
    pub disabled: bool,
}

/// Classification of one backend in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Pass/fail/skip counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Tally {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Result of running one test: an outcome per backend, in backend order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRun {
    pub number: usize,
    pub outcomes: Vec<(Backend, Outcome)>,
}

impl TestRun {
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for (_, outcome) in &self.outcomes {
            tally.record(*outcome);
        }
        tally
    }

    /// True when no backend failed.
    pub fn passed(&self) -> bool {
        !self.tally().has_failures()
    }

    pub fn outcome(&self, backend: Backend) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(b, _)| *b == backend)
            .map(|(_, o)| *o)
    }
}

/// Collaborators used by run and update.
pub struct Harness<'a> {
    pub converter: &'a dyn Converter,
    pub mtimes: &'a dyn ModTimes,
    pub sink: &'a mut dyn ReportSink,
}

impl<'a> Harness<'a> {
    pub fn new(
        converter: &'a dyn Converter,
        mtimes: &'a dyn ModTimes,
        sink: &'a mut dyn ReportSink,
    ) -> Self {
        Self {
            converter,
            mtimes,
            sink,
        }
    }
}

/// Where a block came from, for resolving paths and reporting errors.
pub struct BlockContext<'a> {
    pub src: &'a SourceArc,
    pub conf_dir: &'a Path,
    pub settings: &'a SuiteSettings,
}

// =============================================================================
// PARSING
// =============================================================================

impl TestCase {
    /// Parse a test block. `lines` excludes the block's delimiter line.
    pub fn parse(lines: Vec<Line>, number: usize, ctx: &BlockContext<'_>) -> Result<Self, ConfigError> {
        let mut test = TestCase {
            number,
            name: String::new(),
            title: String::new(),
            description: Vec::new(),
            source: None,
            options: Vec::new(),
            attributes: Attributes::new(),
            backends: ctx.settings.backends.clone(),
            datadir: ctx.settings.datadir.clone(),
            disabled: false,
        };
        let block = lines.clone();
        let mut lines = Lines::new(lines);

        while !lines.at_end() {
            let group = lines.read_until(&DIRECTIVE_START);
            let Some(first) = group.first() else {
                continue;
            };

            if !first.text.starts_with('%') {
                match first.text.strip_prefix('!') {
                    Some(title) => {
                        test.disabled = true;
                        test.title = title.to_string();
                    }
                    None => test.title = first.text.clone(),
                }
                test.description = group[1..].iter().map(|l| l.text.clone()).collect();
                continue;
            }

            let name = DIRECTIVE_HEADER
                .captures(&first.text)
                .and_then(|c| c.name("directive"))
                .map(|m| m.as_str())
                .ok_or_else(|| {
                    ConfigError::at_lines(
                        ConfigErrorKind::MalformedHeader {
                            line: first.text.clone(),
                        },
                        ctx.src,
                        std::slice::from_ref(first),
                    )
                })?;
            let directive: Directive = name.parse().map_err(|_| {
                ConfigError::at_lines(
                    ConfigErrorKind::UnknownDirective {
                        name: name.to_string(),
                    },
                    ctx.src,
                    std::slice::from_ref(first),
                )
            })?;
            trace!(test = number, "directive {}", directive);

            let payload = Payload::new(directive.as_str(), first, &group[1..], ctx.src);
            match directive {
                Directive::Source => {
                    if let Some(path) = payload.first_line() {
                        test.source = Some(resolve(ctx.conf_dir, path));
                    }
                }
                Directive::Options => test.options = payload.options()?,
                Directive::Attributes => test.attributes = payload.attributes()?,
                Directive::Backends => test.backends = payload.backends()?,
                Directive::Name => {
                    let name = payload
                        .first_line()
                        .filter(|n| !n.is_empty())
                        .ok_or_else(|| {
                            payload.error(ConfigErrorKind::EmptyPayload {
                                directive: directive.to_string(),
                            })
                        })?;
                    test.name = name.to_string();
                }
            }
        }

        if test.name.is_empty() {
            test.name = test
                .source
                .as_deref()
                .and_then(Path::file_stem)
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        if test.title.is_empty() {
            test.title = match &test.source {
                Some(source) => source.display().to_string(),
                None => test.name.clone(),
            };
        }
        if test.name.is_empty() {
            return Err(ConfigError::at_lines(
                ConfigErrorKind::MissingIdentity,
                ctx.src,
                &block,
            ));
        }

        debug!(
            test = number,
            name = %test.name,
            disabled = test.disabled,
            "parsed test '{}'",
            test.title
        );
        Ok(test)
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl TestCase {
    /// Path of the golden file for `backend`.
    pub fn backend_filename(&self, backend: Backend) -> PathBuf {
        let stem = normalize_path(self.datadir.join(&self.name));
        let mut file = stem.into_os_string();
        file.push(format!("-{}{}", backend, backend.extension()));
        PathBuf::from(file)
    }

    pub fn is_missing(&self, backend: Backend, mtimes: &dyn ModTimes) -> bool {
        !mtimes.is_file(&self.backend_filename(backend))
    }

    /// True when the golden file is missing or strictly older than the source.
    pub fn is_missing_or_outdated(&self, backend: Backend, mtimes: &dyn ModTimes) -> bool {
        let golden = self.backend_filename(backend);
        if !mtimes.is_file(&golden) {
            return true;
        }
        let source_time = self.source.as_deref().and_then(|s| mtimes.modified(s));
        let golden_time = mtimes.modified(&golden);
        let outdated = match (source_time, golden_time) {
            (Some(source), Some(golden)) => source > golden,
            _ => false,
        };
        trace!(test = self.number, %backend, outdated, "freshness of {}", golden.display());
        outdated
    }

    /// Run the converter for `backend` and return its output lines.
    pub fn generate_expected(
        &self,
        backend: Backend,
        converter: &dyn Converter,
    ) -> Result<Vec<String>, ConvertError> {
        let source = self.source.as_deref().unwrap_or_else(|| Path::new(""));
        let request = ConvertRequest {
            source,
            options: &self.options,
            attributes: &self.attributes,
            backend,
        };
        let output = converter.convert(&request)?;
        Ok(output.lines().map(str::to_string).collect())
    }

    /// Regenerate and write the golden file for `backend`.
    pub fn update_expected(&self, backend: Backend, h: &mut Harness<'_>) -> Result<PathBuf, HarnessError> {
        let lines = self.generate_expected(backend, h.converter)?;
        if !self.datadir.is_dir() {
            h.sink
                .status(Status::Creating, &self.datadir.display().to_string());
            fs::create_dir_all(&self.datadir).map_err(|e| HarnessError::io(&self.datadir, e))?;
        }
        let path = self.backend_filename(backend);
        h.sink.status(Status::Writing, &path.display().to_string());
        let mut contents = String::new();
        for line in &lines {
            contents.push_str(line);
            contents.push_str(LINE_ENDING);
        }
        fs::write(&path, contents).map_err(|e| HarnessError::io(&path, e))?;
        Ok(path)
    }

    /// Regenerate golden files in scope that are missing or outdated, or all
    /// of them when `force` is set. Returns the files written.
    pub fn update(
        &self,
        h: &mut Harness<'_>,
        backend: Option<Backend>,
        force: bool,
    ) -> Result<Vec<PathBuf>, HarnessError> {
        let mut written = Vec::new();
        if !self.source_exists(h.mtimes) {
            self.report_missing_source(h.sink);
            return Ok(written);
        }
        for backend in self.scoped_backends(backend) {
            if force || self.is_missing_or_outdated(backend, h.mtimes) {
                written.push(self.update_expected(backend, h)?);
            } else {
                trace!(test = self.number, %backend, "golden file is current");
            }
        }
        Ok(written)
    }

    /// Compare generated output with the golden files in scope.
    pub fn run(&self, h: &mut Harness<'_>, backend: Option<Backend>) -> Result<TestRun, HarnessError> {
        let backends = self.scoped_backends(backend);
        let mut run = TestRun {
            number: self.number,
            outcomes: Vec::with_capacity(backends.len()),
        };
        h.sink.line(&format!("{}: {}", self.number, self.title));

        if !self.source_exists(h.mtimes) {
            run.outcomes = backends.into_iter().map(|b| (b, Outcome::Skipped)).collect();
            self.report_missing_source(h.sink);
            h.sink.line("");
            return Ok(run);
        }

        if let Some(source) = &self.source {
            h.sink.status(
                Status::Source,
                &format!("{}: {}", h.converter.name(), source.display()),
            );
        }
        for backend in backends {
            let outcome = self.run_backend(h, backend)?;
            run.outcomes.push((backend, outcome));
        }
        h.sink.line("");
        Ok(run)
    }

    fn run_backend(&self, h: &mut Harness<'_>, backend: Backend) -> Result<Outcome, HarnessError> {
        let golden = self.backend_filename(backend);
        let detail = format!("{}: {}", backend, golden.display());
        if self.is_missing(backend, h.mtimes) {
            h.sink.status(Status::Skipped, &detail);
            return Ok(Outcome::Skipped);
        }

        let mut expected = load_lines(&golden)?;
        strip_trailing_blank(&mut expected);
        let mut got = self.generate_expected(backend, h.converter)?;
        strip_trailing_blank(&mut got);

        let diff = unified_diff(&expected, &got);
        if diff.is_empty() {
            h.sink.status(Status::Passed, &detail);
            Ok(Outcome::Passed)
        } else {
            h.sink.status(Status::Failed, &detail);
            report_failure(h.sink, &golden, &diff);
            Ok(Outcome::Failed)
        }
    }

    fn scoped_backends(&self, backend: Option<Backend>) -> Vec<Backend> {
        match backend {
            Some(backend) => vec![backend],
            None => self.backends.clone(),
        }
    }

    fn source_exists(&self, mtimes: &dyn ModTimes) -> bool {
        self.source.as_deref().is_some_and(|s| mtimes.is_file(s))
    }

    fn report_missing_source(&self, sink: &mut dyn ReportSink) {
        match &self.source {
            Some(source) => sink.status(Status::Missing, &source.display().to_string()),
            None => sink.line("NO SOURCE FILE SPECIFIED"),
        }
    }
}

/// Golden file contents, one entry per line without terminators.
fn load_lines(path: &Path) -> Result<Vec<String>, HarnessError> {
    let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(text.lines().map(str::to_string).collect())
}
