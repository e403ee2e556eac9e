//! Directive groups inside a test block: `% source`, `% options`,
//! `% attributes`, `% backends` and `% name`.
//!
//! A [`Payload`] is the comment-stripped body of one group. It knows where its
//! lines came from, so every shape error points back at the configuration file.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use miette::SourceSpan;

use crate::backend::Backend;
use crate::converter::{Attributes, ConverterOption};
use crate::errors::{ConfigError, ConfigErrorKind, SourceArc};
use crate::lines::Line;
use crate::literal::{self, Literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Source,
    Options,
    Attributes,
    Backends,
    Name,
}

impl Directive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directive::Source => "source",
            Directive::Options => "options",
            Directive::Attributes => "attributes",
            Directive::Backends => "backends",
            Directive::Name => "name",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Directive {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Directive::Source),
            "options" => Ok(Directive::Options),
            "attributes" => Ok(Directive::Attributes),
            "backends" => Ok(Directive::Backends),
            "name" => Ok(Directive::Name),
            _ => Err(()),
        }
    }
}

/// Drops `#` comment lines and trailing blank lines.
pub fn normalize_data(lines: &[Line]) -> Vec<Line> {
    let mut result: Vec<Line> = lines
        .iter()
        .filter(|l| !l.text.starts_with('#'))
        .cloned()
        .collect();
    while result.last().is_some_and(Line::is_blank) {
        result.pop();
    }
    result
}

/// The body of one directive group.
#[derive(Debug, Clone)]
pub struct Payload<'a> {
    name: &'a str,
    header: &'a Line,
    lines: Vec<Line>,
    src: &'a SourceArc,
}

impl<'a> Payload<'a> {
    /// `body` is everything after the header line; comments are removed here.
    pub fn new(name: &'a str, header: &'a Line, body: &[Line], src: &'a SourceArc) -> Self {
        Self {
            name,
            header,
            lines: normalize_data(body),
            src,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// First payload line, trimmed, for directives that take a bare string.
    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(|l| l.text.trim())
    }

    pub fn error(&self, kind: ConfigErrorKind) -> ConfigError {
        if self.is_empty() {
            ConfigError::at_lines(kind, self.src, std::slice::from_ref(self.header))
        } else {
            ConfigError::at_lines(kind, self.src, &self.lines)
        }
    }

    fn shape_error(&self, expected: &str, found: &Literal) -> ConfigError {
        self.error(ConfigErrorKind::UnexpectedShape {
            directive: self.name.to_string(),
            expected: expected.to_string(),
            found: found.kind().to_string(),
        })
    }

    /// Parses the payload lines, joined by single spaces, as one literal.
    pub fn literal(&self) -> Result<Literal, ConfigError> {
        if self.is_empty() {
            return Err(self.error(ConfigErrorKind::EmptyPayload {
                directive: self.name.to_string(),
            }));
        }
        let joined = self
            .lines
            .iter()
            .map(Line::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        literal::parse(&joined).map_err(|e| {
            let start = self.file_offset(e.start);
            let end = self.file_offset(e.end).max(start);
            ConfigError::new(
                ConfigErrorKind::InvalidLiteral {
                    directive: self.name.to_string(),
                    message: e.message,
                },
                self.src,
                SourceSpan::from(start..end.max(start + 1)),
            )
        })
    }

    /// Maps an offset in the space-joined payload back into the file.
    fn file_offset(&self, joined: usize) -> usize {
        let mut base = 0;
        for line in &self.lines {
            let len = line.text.len();
            if joined <= base + len {
                return line.offset + (joined - base);
            }
            base += len + 1;
        }
        self.lines.last().map(Line::end).unwrap_or(0)
    }

    pub fn expect_str<'l>(&self, literal: &'l Literal, expected: &str) -> Result<&'l str, ConfigError> {
        literal
            .as_str()
            .ok_or_else(|| self.shape_error(expected, literal))
    }

    /// Mapping entries with string keys, in source order.
    pub fn expect_map<'l>(&self, literal: &'l Literal) -> Result<Vec<(String, &'l Literal)>, ConfigError> {
        let entries = literal
            .as_map()
            .ok_or_else(|| self.shape_error("a {name: value} mapping", literal))?;
        entries
            .iter()
            .map(|(k, v)| {
                k.as_str()
                    .map(|k| (k.to_string(), v))
                    .ok_or_else(|| self.shape_error("string keys", k))
            })
            .collect()
    }

    /// `% options`: a sequence of flags, each a string or a `(flag, value)` pair.
    /// Order and duplicates are preserved.
    pub fn options(&self) -> Result<Vec<ConverterOption>, ConfigError> {
        const EXPECTED: &str = "a sequence of 'flag' or ('flag', value) items";
        let literal = self.literal()?;
        let items = literal
            .as_list()
            .ok_or_else(|| self.shape_error(EXPECTED, &literal))?;
        items
            .iter()
            .map(|item| match item {
                Literal::Str(flag) => Ok((flag.clone(), None)),
                Literal::List(pair) => match pair.as_slice() {
                    [Literal::Str(flag)] => Ok((flag.clone(), None)),
                    [Literal::Str(flag), value] => {
                        let value = value
                            .to_scalar()
                            .ok_or_else(|| self.shape_error("a scalar option value", value))?;
                        Ok((flag.clone(), value))
                    }
                    _ => Err(self.shape_error(EXPECTED, item)),
                },
                other => Err(self.shape_error(EXPECTED, other)),
            })
            .collect()
    }

    /// `% attributes`: a mapping of attribute names to scalar values. `None`
    /// undefines an attribute. Names must be unique.
    pub fn attributes(&self) -> Result<Attributes, ConfigError> {
        let literal = self.literal()?;
        let mut seen = HashSet::new();
        let mut attributes = Attributes::new();
        for (name, value) in self.expect_map(&literal)? {
            if !seen.insert(name.clone()) {
                return Err(self.error(ConfigErrorKind::DuplicateAttribute { name }));
            }
            let value = value
                .to_scalar()
                .ok_or_else(|| self.shape_error("a scalar attribute value", value))?;
            attributes.push((name, value));
        }
        Ok(attributes)
    }

    /// `% backends`: a sequence of backend names, or a single name.
    pub fn backends(&self) -> Result<Vec<Backend>, ConfigError> {
        const EXPECTED: &str = "a sequence of backend names";
        let literal = self.literal()?;
        let names: Vec<&Literal> = match &literal {
            Literal::Str(_) => vec![&literal],
            Literal::List(items) => items.iter().collect(),
            other => return Err(self.shape_error(EXPECTED, other)),
        };
        names
            .into_iter()
            .map(|item| {
                let name = self.expect_str(item, EXPECTED)?;
                name.parse::<Backend>().map_err(|_| {
                    self.error(ConfigErrorKind::UnknownBackend {
                        name: name.to_string(),
                    })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::Lines;
    use miette::NamedSource;
    use regex::Regex;
    use std::sync::Arc;

    fn with_payload<T>(text: &str, f: impl FnOnce(&Payload<'_>) -> T) -> T {
        let src: SourceArc = Arc::new(NamedSource::new("test.conf", text.to_string()));
        let mut lines = Lines::from_text(text);
        let group = lines.read_until(&Regex::new("^$").unwrap());
        let name = group[0].text.trim_start_matches(['%', ' ']).to_string();
        let payload = Payload::new(&name, &group[0], &group[1..], &src);
        f(&payload)
    }

    #[test]
    fn comments_and_trailing_blanks_are_dropped() {
        let lines = Lines::from_text("# note\n['a']\n\n");
        let mut cursor = lines.clone();
        let all = cursor.read_until(&Regex::new("^NEVER$").unwrap());
        let data = normalize_data(&all);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].text, "['a']");
    }

    #[test]
    fn options_normalize_bare_flags() {
        let options = with_payload(
            "% options\n['--section-numbers',\n('--attribute','toc'), ('-a', 3), '-v', '-v']",
            |p| p.options(),
        )
        .unwrap();
        assert_eq!(
            options,
            vec![
                ("--section-numbers".to_string(), None),
                ("--attribute".to_string(), Some("toc".to_string())),
                ("-a".to_string(), Some("3".to_string())),
                ("-v".to_string(), None),
                ("-v".to_string(), None),
            ]
        );
    }

    #[test]
    fn attributes_keep_order_and_undefine_with_none() {
        let attributes = with_payload(
            "% attributes\n# no footer\n{'footer-style':'none', 'icons': None, 'level': 2}",
            |p| p.attributes(),
        )
        .unwrap();
        assert_eq!(
            attributes,
            vec![
                ("footer-style".to_string(), Some("none".to_string())),
                ("icons".to_string(), None),
                ("level".to_string(), Some("2".to_string())),
            ]
        );
    }

    #[test]
    fn duplicate_attributes_are_rejected() {
        let err = with_payload("% attributes\n{'a': 1, 'a': 2}", |p| p.attributes()).unwrap_err();
        assert_eq!(
            err.kind,
            ConfigErrorKind::DuplicateAttribute {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn backends_accept_tuple_or_single_name() {
        let tuple = with_payload("% backends\n('html5',)", |p| p.backends()).unwrap();
        assert_eq!(tuple, vec![Backend::Html5]);
        let single = with_payload("% backends\n'docbook'", |p| p.backends()).unwrap();
        assert_eq!(single, vec![Backend::Docbook]);
        let err = with_payload("% backends\n['html5', 'pdf']", |p| p.backends()).unwrap_err();
        assert_eq!(
            err.kind,
            ConfigErrorKind::UnknownBackend {
                name: "pdf".to_string()
            }
        );
    }

    #[test]
    fn literal_errors_point_into_the_file() {
        let text = "% options\n['a',\n os.system('x')]";
        let err = with_payload(text, |p| p.options()).unwrap_err();
        assert!(matches!(err.kind, ConfigErrorKind::InvalidLiteral { .. }));
        let second_line = text.find(" os").unwrap();
        assert!(err.span.offset() >= second_line);
    }

    #[test]
    fn empty_payload_is_an_error() {
        let err = with_payload("% options\n# only a comment", |p| p.options()).unwrap_err();
        assert_eq!(
            err.kind,
            ConfigErrorKind::EmptyPayload {
                directive: "options".to_string()
            }
        );
    }
}
