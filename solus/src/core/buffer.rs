//! Line-addressed text buffer mutated by executor commands.
//!
//! Lines are numbered from 1. Numbering is never cached: every view and every
//! mutation works on the current line list, so repeated edits compose without
//! drift.

use thiserror::Error;
use tracing::debug;

use crate::core::command::Command;

/// Separator between a line number and the line content in [`LineBuffer::view`].
pub const VIEW_SEPARATOR: char = '|';

/// A command addressed lines that do not exist in the buffer.
///
/// Returned before any mutation happens, so a failed command leaves the buffer
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("line numbers start at 1 (got 0)")]
    ZeroLine,
    #[error("end line {end} is before start line {start}")]
    InvertedRange { start: usize, end: usize },
    #[error("line {line} is out of range (buffer has {len} lines)")]
    OutOfRange { line: usize, len: usize },
}

/// In-memory text resource addressed by 1-based line numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
}

impl LineBuffer {
    /// Build a buffer from text, splitting on `\n`. Empty text is an empty buffer.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: split_lines(text),
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The stored text, lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Render every line as `<n>|<line>` followed by a newline, numbered from 1.
    pub fn view(&self) -> String {
        let mut view = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            view.push_str(&(idx + 1).to_string());
            view.push(VIEW_SEPARATOR);
            view.push_str(line);
            view.push('\n');
        }
        view
    }

    /// Insert `text` after line `line_no`; `0` prepends.
    ///
    /// Embedded newlines produce several new lines. A `line_no` past the end is
    /// clamped so the text is appended.
    pub fn insert_after(&mut self, line_no: usize, text: &str) {
        let at = if line_no > self.lines.len() {
            debug!(
                line_no,
                len = self.lines.len(),
                "insert past end, appending"
            );
            self.lines.len()
        } else {
            line_no
        };
        self.lines.splice(at..at, text.split('\n').map(str::to_string));
    }

    /// Remove lines `start..=end`. `None` removes just `start`.
    pub fn delete_range(&mut self, start: usize, end: Option<usize>) -> Result<(), BufferError> {
        let end = self.check_range(start, end)?;
        self.lines.drain(start - 1..end);
        Ok(())
    }

    /// Replace lines `start..=end` with `text`, which lands where the span started.
    pub fn edit_range(
        &mut self,
        start: usize,
        end: Option<usize>,
        text: &str,
    ) -> Result<(), BufferError> {
        self.delete_range(start, end)?;
        self.insert_after(start - 1, text);
        Ok(())
    }

    /// Apply a parsed command. On error the buffer is unchanged.
    pub fn apply(&mut self, command: &Command) -> Result<(), BufferError> {
        match command {
            Command::Insert { line, text } => {
                self.insert_after(*line, text);
                Ok(())
            }
            Command::Delete {
                start_line,
                end_line,
            } => self.delete_range(*start_line, *end_line),
            Command::Edit {
                start_line,
                end_line,
                text,
            } => self.edit_range(*start_line, *end_line, text),
        }
    }

    /// Validate a 1-based inclusive range and return its resolved end line.
    fn check_range(&self, start: usize, end: Option<usize>) -> Result<usize, BufferError> {
        if start == 0 {
            return Err(BufferError::ZeroLine);
        }
        let end = end.unwrap_or(start);
        if end < start {
            return Err(BufferError::InvertedRange { start, end });
        }
        if end > self.lines.len() {
            return Err(BufferError::OutOfRange {
                line: end,
                len: self.lines.len(),
            });
        }
        Ok(end)
    }
}

/// Reconstruct stored text from a [`LineBuffer::view`] rendering.
///
/// Lines without a `<n>|` prefix are kept as they are.
pub fn strip_view(view: &str) -> String {
    // Split on `\n` only, like `from_text`, so a stored `\r` survives.
    view.split_terminator('\n')
        .map(|line| match line.split_once(VIEW_SEPARATOR) {
            Some((number, rest)) if number.chars().all(|c| c.is_ascii_digit()) => rest,
            _ => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(str::to_string).collect()
}
