//! Tolerant parser for executor responses.
//!
//! Grammar (case-sensitive keywords):
//!
//! ```text
//! INSERT <line> | <text...> END
//! DELETE <start> [<end>] END
//! EDIT <start> [<end>] | <text...> END
//! ```
//!
//! Responses are searched, not matched in full, so commentary around the
//! command is ignored. When several shapes occur, precedence is fixed:
//! INSERT, then DELETE, then EDIT.

use std::num::ParseIntError;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::core::command::{Command, CommandKind};

// After `|`, skip spaces and at most one line break so the first text line keeps
// its indentation. Text runs lazily up to the first whole-word END.
static INSERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\bINSERT\s+(\d+)[ \t]*\|[ \t]*(?:\r?\n)?(.*?)\s*\bEND\b")
        .expect("insert pattern compiles")
});
static DELETE_RE: LazyLock<Regex> = LazyLock::new(|| {
    // No text to protect here, so END may follow the last number directly.
    Regex::new(r"\bDELETE\s+(\d+)(?:[ \t]+(\d+))?\s*END\b").expect("delete pattern compiles")
});
static EDIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\bEDIT\s+(\d+)(?:[ \t]+(\d+))?[ \t]*\|[ \t]*(?:\r?\n)?(.*?)\s*\bEND\b")
        .expect("edit pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// None of the three command shapes occurs in the response.
    #[error("no INSERT, DELETE or EDIT command found in response")]
    NoCommandMatched,
    /// A command shape matched but its fields are unusable.
    #[error("malformed {kind} command: {reason}")]
    MalformedCommand { kind: CommandKind, reason: String },
}

/// Extract the first command from a raw executor response.
///
/// Line numbers are checked for shape only (`start >= 1`, `end >= start`);
/// bounds against the buffer are the buffer's concern.
pub fn parse_command(raw: &str) -> Result<Command, ParseError> {
    if let Some(caps) = INSERT_RE.captures(raw) {
        let line = number(&caps, 1, CommandKind::Insert)?;
        return Ok(Command::Insert {
            line,
            text: text(&caps, 2),
        });
    }

    if let Some(caps) = DELETE_RE.captures(raw) {
        let (start_line, end_line) = line_range(&caps, CommandKind::Delete)?;
        return Ok(Command::Delete {
            start_line,
            end_line,
        });
    }

    if let Some(caps) = EDIT_RE.captures(raw) {
        let (start_line, end_line) = line_range(&caps, CommandKind::Edit)?;
        return Ok(Command::Edit {
            start_line,
            end_line,
            text: text(&caps, 3),
        });
    }

    Err(ParseError::NoCommandMatched)
}

fn line_range(caps: &Captures<'_>, kind: CommandKind) -> Result<(usize, Option<usize>), ParseError> {
    let start = number(caps, 1, kind)?;
    if start == 0 {
        return Err(malformed(kind, "start line must be >= 1".to_string()));
    }
    let end = match caps.get(2) {
        Some(m) => Some(
            m.as_str()
                .parse::<usize>()
                .map_err(|err| bad_number(kind, m.as_str(), &err))?,
        ),
        None => None,
    };
    if let Some(end) = end
        && end < start
    {
        return Err(malformed(
            kind,
            format!("end line {end} is before start line {start}"),
        ));
    }
    Ok((start, end))
}

fn number(caps: &Captures<'_>, group: usize, kind: CommandKind) -> Result<usize, ParseError> {
    let raw = caps.get(group).map_or("", |m| m.as_str());
    raw.parse::<usize>()
        .map_err(|err| bad_number(kind, raw, &err))
}

fn text(caps: &Captures<'_>, group: usize) -> String {
    caps.get(group)
        .map_or(String::new(), |m| m.as_str().to_string())
}

fn bad_number(kind: CommandKind, raw: &str, err: &ParseIntError) -> ParseError {
    malformed(kind, format!("invalid line number {raw:?}: {err}"))
}

fn malformed(kind: CommandKind, reason: String) -> ParseError {
    ParseError::MalformedCommand { kind, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_insert() {
        let cmd = parse_command("INSERT 1 | hello END").expect("parse");
        assert_eq!(
            cmd,
            Command::Insert {
                line: 1,
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn parses_multiline_insert_keeping_indentation() {
        let raw = "Sure, here it is:\nINSERT 3 |\n    i = 0\n    j = len(alist) - 1\nEND\nThanks.";
        let cmd = parse_command(raw).expect("parse");
        assert_eq!(
            cmd,
            Command::Insert {
                line: 3,
                text: "    i = 0\n    j = len(alist) - 1".to_string()
            }
        );
    }

    #[test]
    fn parses_delete_single_and_range() {
        assert_eq!(
            parse_command("DELETE 2 END").expect("single"),
            Command::Delete {
                start_line: 2,
                end_line: None
            }
        );
        assert_eq!(
            parse_command("Remove the comment.\nDELETE 7 9 END").expect("range"),
            Command::Delete {
                start_line: 7,
                end_line: Some(9)
            }
        );
    }

    #[test]
    fn parses_edit_with_range() {
        let raw = "EDIT 2 3 |\nCSX Labs\nThe Best Company\nEND";
        let cmd = parse_command(raw).expect("parse");
        assert_eq!(
            cmd,
            Command::Edit {
                start_line: 2,
                end_line: Some(3),
                text: "CSX Labs\nThe Best Company".to_string()
            }
        );
    }

    #[test]
    fn parses_edit_without_end_line() {
        let cmd = parse_command("EDIT 4 | return result END").expect("parse");
        assert_eq!(
            cmd,
            Command::Edit {
                start_line: 4,
                end_line: None,
                text: "return result".to_string()
            }
        );
    }

    #[test]
    fn empty_text_is_allowed() {
        let cmd = parse_command("EDIT 1 |\nEND").expect("parse");
        assert_eq!(
            cmd,
            Command::Edit {
                start_line: 1,
                end_line: None,
                text: String::new()
            }
        );
    }

    #[test]
    fn insert_wins_over_delete() {
        let raw = "DELETE 1 END\nINSERT 2 | x END";
        assert!(matches!(
            parse_command(raw).expect("parse"),
            Command::Insert { line: 2, .. }
        ));
    }

    #[test]
    fn delete_wins_over_edit() {
        let raw = "EDIT 1 | y END then DELETE 3 END";
        assert!(matches!(
            parse_command(raw).expect("parse"),
            Command::Delete { start_line: 3, .. }
        ));
    }

    #[test]
    fn text_stops_at_first_whole_word_end() {
        let cmd = parse_command("INSERT 1 | BACKEND = 1 END trailing END").expect("parse");
        assert_eq!(
            cmd,
            Command::Insert {
                line: 1,
                text: "BACKEND = 1".to_string()
            }
        );
    }

    #[test]
    fn delete_accepts_end_right_after_number() {
        assert_eq!(
            parse_command("DELETE 2END").expect("single"),
            Command::Delete {
                start_line: 2,
                end_line: None
            }
        );
        assert_eq!(
            parse_command("DELETE 2 4END").expect("range"),
            Command::Delete {
                start_line: 2,
                end_line: Some(4)
            }
        );
        assert_eq!(
            parse_command("DELETE 2 ENDPOINT"),
            Err(ParseError::NoCommandMatched)
        );
    }

    #[test]
    fn end_inside_identifiers_is_kept_in_text() {
        let raw = "EDIT 3 4 |\nBACKEND_URL = ENDPOINT\nif not ENDED:\nEND";
        let cmd = parse_command(raw).expect("parse");
        assert_eq!(
            cmd,
            Command::Edit {
                start_line: 3,
                end_line: Some(4),
                text: "BACKEND_URL = ENDPOINT\nif not ENDED:".to_string()
            }
        );
    }

    #[test]
    fn whole_word_end_inside_text_closes_the_command() {
        // The first standalone END terminates; the rest of the reply is ignored.
        let raw = "INSERT 2 |\n# END of setup\nrun()\nEND";
        let cmd = parse_command(raw).expect("parse");
        assert_eq!(
            cmd,
            Command::Insert {
                line: 2,
                text: "#".to_string()
            }
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            parse_command("insert 1 | hello end"),
            Err(ParseError::NoCommandMatched)
        );
    }

    #[test]
    fn prose_only_matches_nothing() {
        assert_eq!(
            parse_command("The code looks fine; the task is completed."),
            Err(ParseError::NoCommandMatched)
        );
    }

    #[test]
    fn zero_start_line_is_malformed() {
        let err = parse_command("DELETE 0 END").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedCommand {
                kind: CommandKind::Delete,
                ..
            }
        ));
    }

    #[test]
    fn inverted_range_is_malformed() {
        let err = parse_command("EDIT 5 2 | x END").unwrap_err();
        assert!(err.to_string().contains("before start line"));
    }

    #[test]
    fn overflowing_line_number_is_malformed() {
        let err = parse_command("INSERT 99999999999999999999999 | x END").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MalformedCommand {
                kind: CommandKind::Insert,
                ..
            }
        ));
    }
}
