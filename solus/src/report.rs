//! Human-readable and JSON summaries of a finished session.

use serde::Serialize;

use crate::agents::session::SessionReport;
use crate::core::transcript::TranscriptEntry;

/// Everything a caller may want to show after a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary<'a> {
    pub initial: &'a str,
    #[serde(rename = "final")]
    pub refactored: &'a str,
    pub report: &'a SessionReport,
    pub transcript: &'a [TranscriptEntry],
}

impl SessionSummary<'_> {
    /// Plain-text summary: initial view, refactored view, then the steps taken.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("SUMMARY\n_______\n\n");
        out.push_str("Initial Code\n");
        out.push_str(&pad_lines(self.initial));
        out.push_str("\n\nRefactored Code\n");
        out.push_str(&pad_lines(self.refactored));
        out.push_str(&format!(
            "\n\nSTEPS ({} applied, {} skipped)\n_____\n",
            self.report.applied(),
            self.report.skipped()
        ));
        out.push_str(&render_steps(self.transcript));
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One display line per transcript entry.
pub fn render_steps(entries: &[TranscriptEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.display_line());
        out.push('\n');
    }
    out
}

/// Right-pad every line to the width of the longest one so the block reads as a panel.
pub fn pad_lines(text: &str) -> String {
    let text = text.trim_end_matches('\n');
    let width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    text.lines()
        .map(|line| {
            let pad = width - line.chars().count();
            format!("{line}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
