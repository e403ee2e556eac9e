//! The document converter seen from the harness: text + options + attributes
//! in, output lines out.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, trace};

use crate::backend::Backend;
use crate::errors::ConvertError;

/// A converter command-line flag with an optional value, e.g.
/// `("--attribute", Some("toc"))` or `("--section-numbers", None)`.
pub type ConverterOption = (String, Option<String>);

/// Attribute assignments in source order. `None` undefines the attribute.
pub type Attributes = Vec<(String, Option<String>)>;

/// Everything the converter needs for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct ConvertRequest<'a> {
    pub source: &'a Path,
    pub options: &'a [ConverterOption],
    pub attributes: &'a Attributes,
    pub backend: Backend,
}

/// The external document converter.
pub trait Converter {
    /// Short name shown in `SOURCE:` progress lines.
    fn name(&self) -> &str;

    /// Convert `request.source` and return the complete output text.
    fn convert(&self, request: &ConvertRequest<'_>) -> Result<String, ConvertError>;
}

/// Renders an attribute the way the converter's `--attribute` flag expects.
pub fn attribute_arg(name: &str, value: Option<&str>) -> String {
    if name.ends_with('!') || name.ends_with('@') {
        return name.to_string();
    }
    match value {
        None => format!("{}!", name),
        Some("") => name.to_string(),
        Some(v) => format!("{}={}", name, v),
    }
}

/// Builds the full argument vector for one conversion.
pub fn command_args(request: &ConvertRequest<'_>) -> Vec<String> {
    let mut args = Vec::new();
    for (flag, value) in request.options {
        args.push(flag.clone());
        if let Some(value) = value {
            args.push(value.clone());
        }
    }
    args.push("--out-file".to_string());
    args.push("-".to_string());
    args.push("--backend".to_string());
    args.push(request.backend.to_string());
    for (name, value) in request.attributes {
        args.push("--attribute".to_string());
        args.push(attribute_arg(name, value.as_deref()));
    }
    args.push(request.source.display().to_string());
    args
}

/// Runs a converter executable and captures its standard output.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Converter for CommandConverter {
    fn name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }

    fn convert(&self, request: &ConvertRequest<'_>) -> Result<String, ConvertError> {
        let args = command_args(request);
        debug!(program = %self.program, backend = %request.backend, "converting {}", request.source.display());
        trace!("converter arguments: {:?}", args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("exited with {}", output.status));
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                source_file: request.source.to_path_buf(),
                message,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| ConvertError::Encoding {
            program: self.program.clone(),
            source_file: request.source.to_path_buf(),
        })
    }
}
