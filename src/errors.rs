//! Conform Error Handling
//!
//! Three error families surface from the harness:
//!
//! - [`ConfigError`]: the configuration file is malformed. Carries the file text
//!   and the offending span so the CLI can render a `miette` report pointing at
//!   the bad lines.
//! - [`ConvertError`]: the external converter could not produce output. These
//!   are environment defects and abort the run.
//! - [`HarnessError`]: everything the command surface reports, wrapping the two
//!   above plus argument and I/O failures.
//!
//! Per-backend outcomes (missing golden file, differing output) are not errors;
//! they are recorded in [`crate::descriptor::Outcome`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

use crate::lines::Line;

pub type SourceArc = Arc<NamedSource<String>>;

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

/// What is wrong with a configuration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    MalformedHeader { line: String },
    UnknownDirective { name: String },
    EmptyPayload { directive: String },
    InvalidLiteral { directive: String, message: String },
    UnexpectedShape { directive: String, expected: String, found: String },
    UnknownBackend { name: String },
    DuplicateAttribute { name: String },
    MissingIdentity,
}

impl ConfigErrorKind {
    fn code(&self) -> &'static str {
        match self {
            ConfigErrorKind::MalformedHeader { .. } => "conform::config::header",
            ConfigErrorKind::UnknownDirective { .. } => "conform::config::directive",
            ConfigErrorKind::EmptyPayload { .. } => "conform::config::empty",
            ConfigErrorKind::InvalidLiteral { .. } => "conform::config::literal",
            ConfigErrorKind::UnexpectedShape { .. } => "conform::config::shape",
            ConfigErrorKind::UnknownBackend { .. } => "conform::config::backend",
            ConfigErrorKind::DuplicateAttribute { .. } => "conform::config::duplicate",
            ConfigErrorKind::MissingIdentity => "conform::config::identity",
        }
    }

    fn help(&self) -> Option<String> {
        match self {
            ConfigErrorKind::MalformedHeader { .. } => {
                Some("directive headers look like `% source`".to_string())
            }
            ConfigErrorKind::UnknownDirective { .. } => Some(
                "known directives are: source, options, attributes, backends, name".to_string(),
            ),
            ConfigErrorKind::InvalidLiteral { .. } => Some(
                "payloads accept strings, numbers, True/False/None, [..], (..) and {..} only"
                    .to_string(),
            ),
            ConfigErrorKind::UnknownBackend { .. } => Some(format!(
                "known backends are: {}",
                crate::backend::Backend::ALL
                    .iter()
                    .map(|b| b.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            ConfigErrorKind::MissingIdentity => {
                Some("add a `% source` or a `% name` directive".to_string())
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::MalformedHeader { line } => {
                write!(f, "malformed directive header '{}'", line)
            }
            ConfigErrorKind::UnknownDirective { name } => write!(f, "unknown directive '{}'", name),
            ConfigErrorKind::EmptyPayload { directive } => {
                write!(f, "directive '{}' has no value", directive)
            }
            ConfigErrorKind::InvalidLiteral { directive, message } => {
                write!(f, "invalid '{}' payload: {}", directive, message)
            }
            ConfigErrorKind::UnexpectedShape {
                directive,
                expected,
                found,
            } => write!(
                f,
                "invalid '{}' payload: expected {}, found {}",
                directive, expected, found
            ),
            ConfigErrorKind::UnknownBackend { name } => write!(f, "unknown backend '{}'", name),
            ConfigErrorKind::DuplicateAttribute { name } => {
                write!(f, "attribute '{}' is given more than once", name)
            }
            ConfigErrorKind::MissingIdentity => {
                write!(f, "test has neither a source nor a name")
            }
        }
    }
}

/// A fatal problem in the configuration file.
#[derive(Debug, Error)]
#[error("configuration error: {kind}")]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub src: SourceArc,
    pub span: SourceSpan,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, src: &SourceArc, span: SourceSpan) -> Self {
        Self {
            kind,
            src: Arc::clone(src),
            span,
        }
    }

    /// An error covering `lines`, from the start of the first to the end of the last.
    pub fn at_lines(kind: ConfigErrorKind, src: &SourceArc, lines: &[Line]) -> Self {
        Self::new(kind, src, lines_span(lines))
    }
}

impl Diagnostic for ConfigError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some("here".to_string()), self.span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Span from the start of the first line to the end of the last line.
pub fn lines_span(lines: &[Line]) -> SourceSpan {
    match (lines.first(), lines.last()) {
        (Some(first), Some(last)) => SourceSpan::from(first.offset..last.end().max(first.offset)),
        _ => SourceSpan::from(0..0),
    }
}

// ============================================================================
// CONVERTER ERRORS
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error("failed to run converter '{program}'")]
    #[diagnostic(
        code(conform::convert::spawn),
        help("set --converter or CONFORM_CONVERTER to the converter executable")
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("converter '{program}' failed on {}: {message}", source_file.display())]
    #[diagnostic(code(conform::convert::failed))]
    Failed {
        program: String,
        source_file: PathBuf,
        message: String,
    },

    #[error("converter '{program}' produced non UTF-8 output for {}", source_file.display())]
    #[diagnostic(code(conform::convert::encoding))]
    Encoding {
        program: String,
        source_file: PathBuf,
    },
}

// ============================================================================
// HARNESS ERRORS
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("missing configuration file: {}", path.display())]
    #[diagnostic(code(conform::missing_config), help("pass -f/--conf-file"))]
    MissingConfig { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("illegal backend: {name}")]
    #[diagnostic(code(conform::args::backend))]
    UnknownBackend { name: String },

    #[error("illegal test number: {number} (tests are numbered 1 to {count})")]
    #[diagnostic(code(conform::args::number))]
    NumberOutOfRange { number: i64, count: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Convert(#[from] ConvertError),

    #[error("i/o error on {}", path.display())]
    #[diagnostic(code(conform::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}
