//! Converter backends and the golden-file extension table.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A named output format the converter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    Html4,
    Xhtml11,
    Docbook,
    Slidy,
    Html5,
}

/// Backends a test is evaluated against unless it lists its own.
pub const DEFAULT_BACKENDS: [Backend; 4] = [
    Backend::Html4,
    Backend::Xhtml11,
    Backend::Docbook,
    Backend::Html5,
];

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::Html4,
        Backend::Xhtml11,
        Backend::Docbook,
        Backend::Slidy,
        Backend::Html5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Html4 => "html4",
            Backend::Xhtml11 => "xhtml11",
            Backend::Docbook => "docbook",
            Backend::Slidy => "slidy",
            Backend::Html5 => "html5",
        }
    }

    /// Extension of the golden files written for this backend.
    pub fn extension(&self) -> &'static str {
        match self {
            Backend::Docbook => ".xml",
            Backend::Html4 | Backend::Xhtml11 | Backend::Slidy | Backend::Html5 => ".html",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown backend '{0}'")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| UnknownBackend(s.to_string()))
    }
}
