//! Append-only transcript of deliberations and executed commands.
//!
//! Entry order is the conversational order; it is replayed verbatim into every
//! later prompt, so entries are never edited, removed, or reordered.

use serde::Serialize;

use crate::core::command::Command;

/// Role marker for deliberation entries.
pub const DELIBERATOR_MARKER: &str = "DELIBERATOR:";
/// Role marker for executed-command entries.
pub const EXECUTOR_MARKER: &str = "EXECUTOR:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// Free-text reasoning returned by the deliberator.
    Deliberation { message: String },
    /// A command that was parsed and applied to the buffer.
    Command { command: Command },
}

impl TranscriptEntry {
    /// Line used inside prompts. Commands are fenced so the backend can tell the
    /// executor's output apart from deliberation prose.
    pub fn prompt_line(&self) -> String {
        match self {
            TranscriptEntry::Deliberation { message } => {
                format!("{DELIBERATOR_MARKER} {}", message.trim())
            }
            TranscriptEntry::Command { command } => {
                format!("{EXECUTOR_MARKER} ```{}```", command.summary())
            }
        }
    }

    /// Line used in the human-readable step listing.
    pub fn display_line(&self) -> String {
        match self {
            TranscriptEntry::Deliberation { message } => {
                format!("{DELIBERATOR_MARKER} {message}")
            }
            TranscriptEntry::Command { command } => {
                format!("{EXECUTOR_MARKER} {}", command.summary())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_deliberation(&mut self, message: impl Into<String>) {
        self.entries.push(TranscriptEntry::Deliberation {
            message: message.into(),
        });
    }

    pub fn append_command(&mut self, command: Command) {
        self.entries.push(TranscriptEntry::Command { command });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One prompt line per entry, each terminated by a newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.prompt_line());
            out.push('\n');
        }
        out
    }
}
