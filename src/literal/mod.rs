//! Literal values written in directive payloads.
//!
//! Payloads such as `%options` or `%attributes` hold data only. They are parsed
//! by a restricted grammar into [`Literal`] trees; nothing in a payload is ever
//! executed.

mod parser;

pub use parser::{parse, LiteralError};

/// A parsed payload literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Both `[...]` lists and `(...)` tuples.
    List(Vec<Literal>),
    /// `{key: value}` entries in source order.
    Map(Vec<(Literal, Literal)>),
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Literal]> {
        match self {
            Literal::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Literal, Literal)]> {
        match self {
            Literal::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Renders a scalar the way it is handed to the converter.
    ///
    /// `None` maps to an absent value; containers have no scalar form.
    pub fn to_scalar(&self) -> Option<Option<String>> {
        match self {
            Literal::None => Some(None),
            Literal::Bool(b) => Some(Some(if *b { "True" } else { "False" }.to_string())),
            Literal::Int(n) => Some(Some(n.to_string())),
            Literal::Float(n) => Some(Some(format!("{:?}", n))),
            Literal::Str(s) => Some(Some(s.clone())),
            Literal::List(_) | Literal::Map(_) => None,
        }
    }

    /// Short name of the literal's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::None => "None",
            Literal::Bool(_) => "boolean",
            Literal::Int(_) | Literal::Float(_) => "number",
            Literal::Str(_) => "string",
            Literal::List(_) => "sequence",
            Literal::Map(_) => "mapping",
        }
    }
}
