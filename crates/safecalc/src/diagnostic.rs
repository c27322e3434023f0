//! Compiler-style rendering of rejected expressions.
//!
//! A [`Diagnostic`] pairs an error message with the expression text and
//! underlines the offending span. A related span, such as the bracket an
//! unclosed display was opened with, is underlined with `-`:
//!
//! ```text
//! error: unclosed `[` at position 0: expected `]`
//!   |
//! 1 | [1,
//!   | - opened here
//! 2 |  2
//!   |   ^
//!   |
//! ```

use std::fmt;
use std::ops::Range;

/// A span in the expression text (byte offsets, end exclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// An underlined span. The primary label marks the error itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// The rejected expression; empty when rendering without a snippet.
    pub source: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Underline the location of the error.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            primary: true,
        });
        self
    }

    /// Underline a location the error refers back to.
    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            primary: false,
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn write_snippet(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = split_lines(&self.source);

        // Labels grouped under the line they start on, in line order.
        let mut rows: Vec<(usize, &Label)> = self
            .labels
            .iter()
            .map(|label| (locate(&lines, label.span.start).0, label))
            .collect();
        rows.sort_by_key(|(line, _)| *line);

        let last_line = rows.last().map_or(0, |(line, _)| *line);
        let gutter = (last_line + 1).to_string().len();

        writeln!(f, "{:gutter$} |", "")?;
        let mut shown = None;
        for (line, label) in rows {
            if shown != Some(line) {
                writeln!(f, "{:>gutter$} | {}", line + 1, lines[line].1)?;
                shown = Some(line);
            }

            let (_, start_col) = locate(&lines, label.span.start);
            let (end_line, end_col) = locate(&lines, label.span.end);
            let end_col = if end_line == line {
                end_col
            } else {
                lines[line].1.chars().count()
            };
            let width = end_col.saturating_sub(start_col).max(1);
            let marker = if label.primary { "^" } else { "-" };

            write!(f, "{:gutter$} | {:start_col$}{}", "", "", marker.repeat(width))?;
            if !label.message.is_empty() {
                write!(f, " {}", label.message)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{:gutter$} |", "")
    }
}

/// Each line of `source` with the byte offset it starts at.
fn split_lines(source: &str) -> Vec<(usize, &str)> {
    let mut start = 0;
    source
        .split('\n')
        .map(|line| {
            let entry = (start, line.trim_end_matches('\r'));
            start += line.len() + 1;
            entry
        })
        .collect()
}

/// Zero-based line index and char column of a byte offset.
fn locate(lines: &[(usize, &str)], offset: usize) -> (usize, usize) {
    let line = lines
        .partition_point(|(start, _)| *start <= offset)
        .saturating_sub(1);
    let (start, text) = lines[line];
    let column = text
        .char_indices()
        .take_while(|(i, _)| start + i < offset)
        .count();
    (line, column)
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;
        if !self.source.is_empty() && !self.labels.is_empty() {
            self.write_snippet(f)?;
        }
        for note in &self.notes {
            writeln!(f, "  = note: {}", note)?;
        }
        if let Some(help) = &self.help {
            writeln!(f, "  = help: {}", help)?;
        }
        Ok(())
    }
}
