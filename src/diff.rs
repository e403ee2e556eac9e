//! Line-oriented comparison of golden and generated output.
//!
//! The edit script comes from [`difference::Changeset`]; this module lays it
//! out as a zero-context unified diff and writes failure reports.

use std::path::Path;

use difference::{Changeset, Difference};

use crate::report::ReportSink;

/// Header lines dropped from the diff before it is reported.
const REPORT_SKIP: usize = 3;

// Keeps empty lines distinguishable from "no token" inside the changeset.
const LINE_MARK: char = '\u{1}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal(usize),
    Delete(usize),
    Insert(usize),
}

#[derive(Debug, Clone, Copy, Default)]
struct Hunk {
    got_start: usize,
    got_len: usize,
    expected_start: usize,
    expected_len: usize,
}

/// Removes blank entries from the end of `lines`.
pub fn strip_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
}

/// Zero-context unified diff turning `got` into `expected`.
///
/// Lines only in the generated output are prefixed `-`, lines only in the
/// golden file `+`. An empty result means the sequences are identical.
pub fn unified_diff(expected: &[String], got: &[String]) -> Vec<String> {
    if expected == got {
        return Vec::new();
    }

    let mut out = vec!["--- got".to_string(), "+++ expected".to_string()];
    let mut hunk: Option<Hunk> = None;
    let (mut i, mut j) = (0, 0);

    for op in edit_script(got, expected) {
        match op {
            Op::Equal(n) => {
                if let Some(h) = hunk.take() {
                    write_hunk(&mut out, &h, got, expected);
                }
                i += n;
                j += n;
            }
            Op::Delete(n) => {
                let h = hunk.get_or_insert(Hunk {
                    got_start: i,
                    expected_start: j,
                    ..Hunk::default()
                });
                h.got_len += n;
                i += n;
            }
            Op::Insert(n) => {
                let h = hunk.get_or_insert(Hunk {
                    got_start: i,
                    expected_start: j,
                    ..Hunk::default()
                });
                h.expected_len += n;
                j += n;
            }
        }
    }
    if let Some(h) = hunk.take() {
        write_hunk(&mut out, &h, got, expected);
    }
    out
}

/// Writes a failure report for `golden` to the error stream.
pub fn report_failure(sink: &mut dyn ReportSink, golden: &Path, diff: &[String]) {
    sink.error_line(&format!("+++ {}", golden.display()));
    sink.error_line("--- got");
    for line in diff.iter().skip(REPORT_SKIP) {
        sink.error_line(line);
    }
    sink.error_line("");
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// Common leading and trailing lines are matched directly; only the differing
/// middle goes through the changeset, whose cost grows with the product of
/// both lengths.
fn edit_script(from: &[String], to: &[String]) -> Vec<Op> {
    let prefix = from.iter().zip(to).take_while(|(a, b)| a == b).count();
    let suffix = from[prefix..]
        .iter()
        .rev()
        .zip(to[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let mut ops = Vec::new();
    if prefix > 0 {
        ops.push(Op::Equal(prefix));
    }
    ops.extend(middle_script(
        &from[prefix..from.len() - suffix],
        &to[prefix..to.len() - suffix],
    ));
    if suffix > 0 {
        ops.push(Op::Equal(suffix));
    }
    ops
}

fn middle_script(from: &[String], to: &[String]) -> Vec<Op> {
    match (from.is_empty(), to.is_empty()) {
        (true, true) => return Vec::new(),
        (true, false) => return vec![Op::Insert(to.len())],
        (false, true) => return vec![Op::Delete(from.len())],
        (false, false) => {}
    }

    let changeset = Changeset::new(&mark_lines(from), &mark_lines(to), "\n");
    changeset
        .diffs
        .iter()
        .map(|d| match d {
            Difference::Same(x) => Op::Equal(count_lines(x)),
            Difference::Rem(x) => Op::Delete(count_lines(x)),
            Difference::Add(x) => Op::Insert(count_lines(x)),
        })
        .collect()
}

fn mark_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| format!("{}{}", LINE_MARK, l))
        .collect::<Vec<_>>()
        .join("\n")
}

fn count_lines(chunk: &str) -> usize {
    chunk.split('\n').count()
}

fn write_hunk(out: &mut Vec<String>, h: &Hunk, got: &[String], expected: &[String]) {
    out.push(format!(
        "@@ -{} +{} @@",
        format_range(h.got_start, h.got_len),
        format_range(h.expected_start, h.expected_len)
    ));
    for line in &got[h.got_start..h.got_start + h.got_len] {
        out.push(format!("-{}", line));
    }
    for line in &expected[h.expected_start..h.expected_start + h.expected_len] {
        out.push(format!("+{}", line));
    }
}

/// Unified-diff range: 1-based start, length omitted when 1, and an empty
/// range names the line before it.
fn format_range(start: usize, len: usize) -> String {
    match len {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        n => format!("{},{}", start + 1, n),
    }
}
