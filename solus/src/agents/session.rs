//! Refactor loop: alternate deliberate and execute phases for a fixed number
//! of rounds against one buffer.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::agents::context::AgentContext;
use crate::agents::prompt::Policy;
use crate::core::buffer::{BufferError, LineBuffer};
use crate::core::command::Command;
use crate::core::parser::{ParseError, parse_command};
use crate::core::transcript::Transcript;
use crate::io::backend::{BackendError, Completion};

/// Rounds run when the caller does not choose.
pub const DEFAULT_ITERATIONS: u32 = 3;

/// Why a round ended early.
///
/// Every kind except [`RoundError::Internal`] skips only the current round.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
    #[error("no command matched in executor reply")]
    NoCommandMatched,
    #[error("{0}")]
    MalformedCommand(ParseError),
    #[error("buffer mutation failed: {0}")]
    BufferMutation(#[from] BufferError),
    /// Prompt rendering failed. This is a bug, not a bad round.
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl From<ParseError> for RoundError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::NoCommandMatched => RoundError::NoCommandMatched,
            malformed @ ParseError::MalformedCommand { .. } => {
                RoundError::MalformedCommand(malformed)
            }
        }
    }
}

/// Stable label for each recoverable failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BackendFailure,
    NoCommandMatched,
    MalformedCommand,
    BufferMutationError,
}

impl RoundError {
    /// Failure kind for recoverable errors; `None` for internal ones.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            RoundError::Backend(_) => Some(FailureKind::BackendFailure),
            RoundError::NoCommandMatched => Some(FailureKind::NoCommandMatched),
            RoundError::MalformedCommand(_) => Some(FailureKind::MalformedCommand),
            RoundError::BufferMutation(_) => Some(FailureKind::BufferMutationError),
            RoundError::Internal(_) => None,
        }
    }
}

/// What happened in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RoundResult {
    Applied { command: Command },
    Skipped { kind: FailureKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    /// Round number (1-indexed).
    pub round: u32,
    #[serde(flatten)]
    pub result: RoundResult,
}

/// Summary of a session run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub rounds: Vec<RoundOutcome>,
}

impl SessionReport {
    pub fn applied(&self) -> usize {
        self.rounds
            .iter()
            .filter(|r| matches!(r.result, RoundResult::Applied { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.rounds.len() - self.applied()
    }
}

/// One refactoring session over one buffer.
///
/// The session exclusively owns its buffer and transcript; independent sessions
/// share nothing.
pub struct RefactorSession<B: Completion> {
    buffer: LineBuffer,
    context: AgentContext,
    backend: B,
}

impl<B: Completion> RefactorSession<B> {
    /// Start a session on `source`. Leading and trailing blank lines are dropped.
    pub fn new(source: &str, backend: B, policy: Policy) -> anyhow::Result<Self> {
        let source = source.trim_matches(|c| c == '\n' || c == '\r');
        Ok(Self {
            buffer: LineBuffer::from_text(source),
            context: AgentContext::new(policy)?,
            backend,
        })
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn transcript(&self) -> &Transcript {
        self.context.transcript()
    }

    /// Ask the deliberator for its reasoning and record it.
    pub fn deliberate(&mut self) -> Result<String, RoundError> {
        let prompt = self
            .context
            .render_deliberator_prompt(&self.buffer)
            .map_err(RoundError::Internal)?;
        let deliberation = self.backend.complete(&prompt)?;
        debug!(bytes = deliberation.len(), "deliberation received");
        self.context.append_deliberation(deliberation.clone());
        Ok(deliberation)
    }

    /// Ask the executor for one command, apply it, and record it.
    pub fn execute(&mut self) -> Result<Command, RoundError> {
        let prompt = self
            .context
            .render_executor_prompt(&self.buffer)
            .map_err(RoundError::Internal)?;
        let reply = self.backend.complete(&prompt)?;
        let command = parse_command(&reply)?;
        self.buffer.apply(&command)?;
        info!(command = %command.kind(), lines = self.buffer.line_count(), "command applied");
        self.context.append_command(command.clone());
        Ok(command)
    }

    /// One deliberate + execute cycle.
    pub fn run_round(&mut self) -> Result<Command, RoundError> {
        self.deliberate()?;
        self.execute()
    }

    /// Run `iterations` rounds. See [`RefactorSession::run_with`].
    pub fn run(&mut self, iterations: u32) -> anyhow::Result<SessionReport> {
        self.run_with(iterations, |_| {})
    }

    /// Run `iterations` rounds, calling `on_round` after each.
    ///
    /// A failed round is recorded and skipped: no retry, no rollback. Only
    /// internal errors abort the session.
    #[instrument(skip_all, fields(iterations = iterations))]
    pub fn run_with<F: FnMut(&RoundOutcome)>(
        &mut self,
        iterations: u32,
        mut on_round: F,
    ) -> anyhow::Result<SessionReport> {
        let mut report = SessionReport::default();
        for round in 1..=iterations {
            let result = match self.run_round() {
                Ok(command) => RoundResult::Applied { command },
                Err(err) => match err.kind() {
                    Some(kind) => {
                        warn!(round, kind = ?kind, err = %err, "round skipped");
                        RoundResult::Skipped {
                            kind,
                            message: err.to_string(),
                        }
                    }
                    None => return Err(anyhow::Error::new(err)),
                },
            };
            let outcome = RoundOutcome { round, result };
            on_round(&outcome);
            report.rounds.push(outcome);
        }
        info!(
            applied = report.applied(),
            skipped = report.skipped(),
            "session finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBackend;

    fn session(
        source: &str,
        replies: Vec<Result<&str, BackendError>>,
    ) -> RefactorSession<ScriptedBackend> {
        RefactorSession::new(source, ScriptedBackend::new(replies), Policy::default())
            .expect("session")
    }

    #[test]
    fn round_applies_insert_and_records_both_phases() {
        let mut session = session(
            "a\nb",
            vec![Ok("Add a greeting after line 1."), Ok("INSERT 1 | hello END")],
        );

        let command = session.run_round().expect("round");
        assert_eq!(
            command,
            Command::Insert {
                line: 1,
                text: "hello".to_string()
            }
        );
        assert_eq!(session.buffer().lines(), ["a", "hello", "b"]);
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn new_drops_surrounding_blank_lines_only() {
        let session = session("\n    indented\nx\n\n", Vec::new());
        assert_eq!(session.buffer().lines(), ["    indented", "x"]);
    }

    #[test]
    fn unparseable_reply_keeps_deliberation_and_buffer() {
        let mut session = session("a\nb\nc", vec![Ok("Think."), Ok("I would rather not.")]);

        let err = session.run_round().unwrap_err();
        assert!(matches!(err, RoundError::NoCommandMatched));
        assert_eq!(session.buffer().text(), "a\nb\nc");
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn out_of_range_command_is_buffer_error() {
        let mut session = session("a", vec![Ok("Delete it all."), Ok("DELETE 1 9 END")]);

        let err = session.run_round().unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::BufferMutationError));
        assert_eq!(session.buffer().text(), "a");
    }

    #[test]
    fn malformed_reply_maps_to_malformed_kind() {
        let mut session = session("a", vec![Ok("Delete."), Ok("DELETE 0 END")]);
        let err = session.run_round().unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::MalformedCommand));
    }

    #[test]
    fn run_skips_failed_rounds_and_continues() {
        let mut session = session(
            "a\nb\nc",
            vec![
                Err(BackendError::EmptyResponse),
                Ok("Drop line 2."),
                Ok("DELETE 2 END"),
                Ok("Done, the task is completed."),
                Ok("Nothing to do."),
            ],
        );

        let mut seen = Vec::new();
        let report = session
            .run_with(3, |outcome| seen.push(outcome.round))
            .expect("run");

        assert_eq!(seen, [1, 2, 3]);
        assert_eq!(report.applied(), 1);
        assert_eq!(report.skipped(), 2);
        assert!(matches!(
            report.rounds[0].result,
            RoundResult::Skipped {
                kind: FailureKind::BackendFailure,
                ..
            }
        ));
        assert!(matches!(
            report.rounds[2].result,
            RoundResult::Skipped {
                kind: FailureKind::NoCommandMatched,
                ..
            }
        ));
        assert_eq!(session.buffer().lines(), ["a", "c"]);
    }
}
