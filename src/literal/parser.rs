//! Pest-backed parser for payload literals.

use pest::{error::InputLocation, iterators::Pair, Parser};
use pest_derive::Parser;
use thiserror::Error;

use super::Literal;

#[derive(Parser)]
#[grammar = "literal/grammar.pest"]
struct LiteralParser;

/// A payload that is not a well-formed literal.
///
/// `start..end` is a byte range into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LiteralError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse a single literal value from `text`.
pub fn parse(text: &str) -> Result<Literal, LiteralError> {
    let mut pairs = LiteralParser::parse(Rule::payload, text).map_err(convert_parse_error)?;
    let payload = pairs.next().ok_or_else(|| LiteralError {
        message: "empty payload".to_string(),
        start: 0,
        end: text.len(),
    })?;
    let value = payload
        .into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .ok_or_else(|| LiteralError {
            message: "expected a literal value".to_string(),
            start: 0,
            end: text.len(),
        })?;
    build_literal(value)
}

// ============================================================================
// BUILDERS
// ============================================================================

fn build_literal(pair: Pair<Rule>) -> Result<Literal, LiteralError> {
    match pair.as_rule() {
        Rule::none => Ok(Literal::None),

        Rule::boolean => Ok(Literal::Bool(matches!(pair.as_str(), "True" | "true"))),

        Rule::number => build_number(&pair),

        Rule::string => Ok(Literal::Str(unescape_string(pair.as_str()))),

        Rule::list => {
            let items = pair
                .into_inner()
                .filter(|p| p.as_rule() != Rule::trailing_comma)
                .map(build_literal)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Literal::List(items))
        }

        Rule::tuple => {
            let mut trailing_comma = false;
            let mut items = Vec::new();
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::trailing_comma {
                    trailing_comma = true;
                } else {
                    items.push(build_literal(inner)?);
                }
            }
            // `(x)` is grouping, `(x,)` is a one-element tuple.
            if items.len() == 1 && !trailing_comma {
                Ok(items.remove(0))
            } else {
                Ok(Literal::List(items))
            }
        }

        Rule::mapping => {
            let mut entries = Vec::new();
            for entry in pair.into_inner() {
                let span = entry.as_span();
                let mut kv = entry.into_inner();
                let (Some(key), Some(value)) = (kv.next(), kv.next()) else {
                    return Err(LiteralError {
                        message: "mapping entry needs a key and a value".to_string(),
                        start: span.start(),
                        end: span.end(),
                    });
                };
                entries.push((build_literal(key)?, build_literal(value)?));
            }
            Ok(Literal::Map(entries))
        }

        rule => {
            let span = pair.as_span();
            Err(LiteralError {
                message: format!("unsupported rule: {:?}", rule),
                start: span.start(),
                end: span.end(),
            })
        }
    }
}

fn build_number(pair: &Pair<Rule>) -> Result<Literal, LiteralError> {
    let text = pair.as_str();
    let invalid = || LiteralError {
        message: format!("invalid number '{}'", text),
        start: pair.as_span().start(),
        end: pair.as_span().end(),
    };
    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().map(Literal::Float).map_err(|_| invalid())
    } else {
        text.parse::<i64>().map(Literal::Int).map_err(|_| invalid())
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

fn unescape_string(text: &str) -> String {
    // Remove surrounding quotes
    let inner = &text[1..text.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

fn convert_parse_error(error: pest::error::Error<Rule>) -> LiteralError {
    let (start, end) = match error.location {
        InputLocation::Pos(pos) => (pos, pos),
        InputLocation::Span((start, end)) => (start, end),
    };
    LiteralError {
        message: format!("not a literal: {}", error.variant.message()),
        start,
        end,
    }
}
