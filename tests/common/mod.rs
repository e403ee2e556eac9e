//! Shared fixtures for the integration tests: a scratch suite directory and
//! an in-process converter that needs no external program.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use conform::backend::Backend;
use conform::converter::{ConvertRequest, Converter};
use conform::errors::ConvertError;
use tempfile::TempDir;

/// Wraps each source line in markup that depends on the backend, and
/// records every invocation.
#[derive(Default)]
pub struct EchoConverter {
    pub calls: RefCell<Vec<(PathBuf, Backend)>>,
}

impl EchoConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Converter for EchoConverter {
    fn name(&self) -> &str {
        "echo"
    }

    fn convert(&self, request: &ConvertRequest<'_>) -> Result<String, ConvertError> {
        self.calls
            .borrow_mut()
            .push((request.source.to_path_buf(), request.backend));
        let text = fs::read_to_string(request.source).map_err(|e| ConvertError::Spawn {
            program: "echo".to_string(),
            source: e,
        })?;
        let tag = match request.backend {
            Backend::Docbook => "simpara",
            _ => "p",
        };
        let mut out = format!("<!-- {} -->\n", request.backend);
        for (name, value) in request.attributes {
            out.push_str(&format!("<!-- {}={:?} -->\n", name, value));
        }
        for line in text.lines() {
            out.push_str(&format!("<{tag}>{line}</{tag}>\n"));
        }
        // Trailing blank lines must not affect comparison.
        out.push('\n');
        Ok(out)
    }
}

/// A converter that always fails.
pub struct BrokenConverter;

impl Converter for BrokenConverter {
    fn name(&self) -> &str {
        "broken"
    }

    fn convert(&self, request: &ConvertRequest<'_>) -> Result<String, ConvertError> {
        Err(ConvertError::Failed {
            program: "broken".to_string(),
            source_file: request.source.to_path_buf(),
            message: "ERROR: simulated failure".to_string(),
        })
    }
}

/// A temporary directory holding `conformance.conf` and its cases.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn conf(&self, contents: &str) -> PathBuf {
        self.write("conformance.conf", contents)
    }

    pub fn exists(&self, rel: &str) -> bool {
        Path::new(&self.path(rel)).is_file()
    }
}

/// Two tests with one backend each; golden files go to `data/`.
pub const TWO_TESTS: &str = "\
% globals
{'datadir': 'data'}
%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
Paragraphs
Plain paragraphs only.
% source
cases/paragraphs.txt
% backends
['docbook']
%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%
Lists
% source
cases/lists.txt
% attributes
{'icons': None}
% backends
('html5',)
";

pub fn two_test_fixture() -> Fixture {
    let fx = Fixture::new();
    fx.conf(TWO_TESTS);
    fx.write("cases/paragraphs.txt", "First paragraph.\n\nSecond paragraph.\n");
    fx.write("cases/lists.txt", "- one\n- two\n");
    fx
}
