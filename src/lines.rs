//! Line cursor used to split configuration text into blocks and directive groups.
//!
//! Every line is right-trimmed on the way in and keeps its byte offset and line
//! number so errors can point back into the configuration file.

use regex::Regex;

/// A single right-trimmed line of configuration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The line text with trailing whitespace removed.
    pub text: String,
    /// Byte offset of the first character of the line in the source text.
    pub offset: usize,
    /// 1-based line number in the source text.
    pub number: usize,
}

impl Line {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset one past the last (trimmed) character of the line.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// A sequentially scanned, rewindable sequence of lines.
#[derive(Debug, Clone, Default)]
pub struct Lines {
    lines: Vec<Line>,
    pos: usize,
}

impl Lines {
    /// Splits `text` into lines, trimming trailing whitespace from each.
    pub fn from_text(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for (index, raw) in text.split_inclusive('\n').enumerate() {
            lines.push(Line {
                text: raw.trim_end().to_string(),
                offset,
                number: index + 1,
            });
            offset += raw.len();
        }
        Self { lines, pos: 0 }
    }

    /// Wraps already split lines, starting at the first one.
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines, pos: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the lines from the current position up to, but not including,
    /// the next line matching `pattern`, and advances to that line.
    ///
    /// The line at the current position is always taken, even when it matches,
    /// so repeated calls make progress through consecutive matching lines.
    pub fn read_until(&mut self, pattern: &Regex) -> Vec<Line> {
        let mut result = Vec::new();
        if let Some(first) = self.lines.get(self.pos) {
            result.push(first.clone());
            self.pos += 1;
        }
        while let Some(line) = self.lines.get(self.pos) {
            if pattern.is_match(&line.text) {
                break;
            }
            result.push(line.clone());
            self.pos += 1;
        }
        result
    }
}
