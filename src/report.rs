//! User-facing output for test runs.
//!
//! Progress and status lines go to standard output, failure diffs to the
//! error stream. [`ConsoleSink`] writes to the terminal with colored status
//! words; [`BufferSink`] collects both streams for programmatic capture.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Status words printed in front of progress lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Failed,
    Skipped,
    Missing,
    Source,
    Creating,
    Writing,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "PASSED",
            Status::Failed => "FAILED",
            Status::Skipped => "SKIPPED",
            Status::Missing => "MISSING",
            Status::Source => "SOURCE",
            Status::Creating => "CREATING",
            Status::Writing => "WRITING",
        }
    }

    fn color(&self) -> Option<Color> {
        match self {
            Status::Passed => Some(Color::Green),
            Status::Failed => Some(Color::Red),
            Status::Skipped | Status::Missing => Some(Color::Yellow),
            Status::Creating | Status::Writing => Some(Color::Cyan),
            Status::Source => None,
        }
    }
}

pub trait ReportSink {
    /// A plain line on standard output.
    fn line(&mut self, text: &str);

    /// `STATUS: detail` on standard output.
    fn status(&mut self, status: Status, detail: &str);

    /// A line on the error stream.
    fn error_line(&mut self, text: &str);
}

// ============================================================================
// CONSOLE
// ============================================================================

/// Writes to the process's stdout and stderr.
pub struct ConsoleSink {
    stdout: StandardStream,
    stderr: StandardStream,
}

impl ConsoleSink {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stdout: StandardStream::stdout(resolve_choice(choice, atty::Stream::Stdout)),
            stderr: StandardStream::stderr(resolve_choice(choice, atty::Stream::Stderr)),
        }
    }
}

/// `Auto` only colors when the stream is a terminal.
fn resolve_choice(choice: ColorChoice, stream: atty::Stream) -> ColorChoice {
    match choice {
        ColorChoice::Auto if !atty::is(stream) => ColorChoice::Never,
        other => other,
    }
}

impl ReportSink for ConsoleSink {
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.stdout, "{}", text);
    }

    fn status(&mut self, status: Status, detail: &str) {
        if let Some(color) = status.color() {
            let _ = self
                .stdout
                .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        }
        let _ = write!(self.stdout, "{}", status.as_str());
        let _ = self.stdout.reset();
        let _ = writeln!(self.stdout, ": {}", detail);
    }

    fn error_line(&mut self, text: &str) {
        let _ = writeln!(self.stderr, "{}", text);
    }
}

// ============================================================================
// BUFFER
// ============================================================================

/// Collects output in memory, one entry per line.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }

    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }
}

impl ReportSink for BufferSink {
    fn line(&mut self, text: &str) {
        self.stdout.push(text.to_string());
    }

    fn status(&mut self, status: Status, detail: &str) {
        self.stdout.push(format!("{}: {}", status.as_str(), detail));
    }

    fn error_line(&mut self, text: &str) {
        self.stderr.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_separates_streams() {
        let mut sink = BufferSink::new();
        sink.line("1: Title");
        sink.status(Status::Passed, "html5: data/a-html5.html");
        sink.error_line("+++ data/a-html5.html");
        assert_eq!(sink.stdout_text(), "1: Title\nPASSED: html5: data/a-html5.html");
        assert_eq!(sink.stderr, ["+++ data/a-html5.html"]);
    }

    #[test]
    fn explicit_choices_are_kept() {
        assert_eq!(
            resolve_choice(ColorChoice::Never, atty::Stream::Stdout),
            ColorChoice::Never
        );
        assert_eq!(
            resolve_choice(ColorChoice::Always, atty::Stream::Stdout),
            ColorChoice::Always
        );
    }
}
