//! Typed executor commands and their transcript rendering.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String parameters longer than this many characters are shortened for display.
pub const TRUNCATE_OVER_CHARS: usize = 100;
/// Characters kept from each end of a shortened parameter.
pub const TRUNCATE_KEEP_CHARS: usize = 50;
/// Marker joining the kept head and tail of a shortened parameter.
pub const ELLIPSIS: &str = "...";

/// One line-addressed edit produced by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Command {
    /// Insert `text` after `line` (`0` prepends).
    Insert { line: usize, text: String },
    /// Delete `start_line..=end_line`, or just `start_line` when `end_line` is absent.
    Delete {
        start_line: usize,
        end_line: Option<usize>,
    },
    /// Replace `start_line..=end_line` with `text`.
    Edit {
        start_line: usize,
        end_line: Option<usize>,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandKind {
    Insert,
    Delete,
    Edit,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Insert => "INSERT",
            CommandKind::Delete => "DELETE",
            CommandKind::Edit => "EDIT",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Insert { .. } => CommandKind::Insert,
            Command::Delete { .. } => CommandKind::Delete,
            Command::Edit { .. } => CommandKind::Edit,
        }
    }

    /// Command parameters keyed by name. An absent end line is `null`.
    pub fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        match self {
            Command::Insert { line, text } => {
                params.insert("line".to_string(), Value::from(*line));
                params.insert("text".to_string(), Value::from(text.as_str()));
            }
            Command::Delete {
                start_line,
                end_line,
            } => {
                params.insert("start_line".to_string(), Value::from(*start_line));
                params.insert("end_line".to_string(), Value::from(*end_line));
            }
            Command::Edit {
                start_line,
                end_line,
                text,
            } => {
                params.insert("start_line".to_string(), Value::from(*start_line));
                params.insert("end_line".to_string(), Value::from(*end_line));
                params.insert("text".to_string(), Value::from(text.as_str()));
            }
        }
        params
    }

    /// `KIND {params}` with long string parameters shortened.
    pub fn summary(&self) -> String {
        format!("{} {}", self.kind(), render_params(&self.params()))
    }
}

/// Render parameters as a JSON object, shortening long string values.
pub fn render_params(params: &Map<String, Value>) -> String {
    let truncated: Map<String, Value> = params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(truncate_middle(s)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect();
    Value::Object(truncated).to_string()
}

/// Shorten strings over [`TRUNCATE_OVER_CHARS`] characters to head + `...` + tail.
pub fn truncate_middle(value: &str) -> String {
    let count = value.chars().count();
    if count <= TRUNCATE_OVER_CHARS {
        return value.to_string();
    }
    let head: String = value.chars().take(TRUNCATE_KEEP_CHARS).collect();
    let tail: String = value.chars().skip(count - TRUNCATE_KEEP_CHARS).collect();
    format!("{head}{ELLIPSIS}{tail}")
}
