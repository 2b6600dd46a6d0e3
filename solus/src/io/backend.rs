//! Completion backend abstraction.
//!
//! The [`Completion`] trait decouples the refactor loop from the service that
//! produces text. [`CommandBackend`] shells out to a configured program; tests
//! use scripted backends that return predetermined replies.

use std::process::Command;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::io::config::BackendConfig;
use crate::io::process::run_with_timeout;

/// Characters of stderr kept in [`BackendError::Failed`].
const STDERR_TAIL_CHARS: usize = 2_000;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("completion timed out after {0:?}")]
    TimedOut(Duration),
    #[error("completion command exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("completion returned an empty reply")]
    EmptyResponse,
    #[error(transparent)]
    Process(#[from] anyhow::Error),
}

/// A text completion service: one prompt in, one reply out.
///
/// Calls are blocking; the refactor loop never has more than one in flight.
pub trait Completion {
    fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

impl<C: Completion + ?Sized> Completion for &C {
    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        (**self).complete(prompt)
    }
}

/// Backend that runs an external program per completion.
///
/// The whole prompt goes to stdin as the single system message; stdout is the reply.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandBackend {
    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Self> {
        let mut command = config.resolved_command().into_iter();
        let program = command
            .next()
            .filter(|program| !program.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("backend.command must be a non-empty array"))?;
        Ok(Self {
            program,
            args: command.collect(),
            timeout: Duration::from_secs(config.timeout_secs),
            output_limit_bytes: config.output_limit_bytes,
        })
    }
}

impl Completion for CommandBackend {
    #[instrument(skip_all, fields(program = %self.program, prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        info!("requesting completion");
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        let output = run_with_timeout(
            cmd,
            prompt.as_bytes(),
            self.timeout,
            self.output_limit_bytes,
        )?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "completion timed out");
            return Err(BackendError::TimedOut(self.timeout));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "completion command failed");
            return Err(BackendError::Failed {
                code: output.status.code(),
                stderr: output.stderr_tail(STDERR_TAIL_CHARS),
            });
        }

        let reply = output.stdout_text().trim().to_string();
        if reply.is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        debug!(reply_bytes = reply.len(), "completion received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &[&str]) -> BackendConfig {
        BackendConfig {
            command: command.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 5,
            ..BackendConfig::default()
        }
    }

    #[test]
    fn from_config_substitutes_model() {
        let backend = CommandBackend::from_config(&BackendConfig::default()).expect("backend");
        assert_eq!(backend.program, "llm");
        assert_eq!(backend.args, ["--model", "gpt-4"]);
    }

    #[test]
    fn from_config_rejects_blank_program() {
        assert!(CommandBackend::from_config(&config(&[" "])).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn echoes_prompt_through_cat() {
        let backend = CommandBackend::from_config(&config(&["cat"])).expect("backend");
        let reply = backend.complete("  INSERT 1 | x END\n").expect("complete");
        assert_eq!(reply, "INSERT 1 | x END");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let backend = CommandBackend::from_config(&config(&["sh", "-c", "echo boom >&2; exit 3"]))
            .expect("backend");
        match backend.complete("prompt") {
            Err(BackendError::Failed { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn empty_reply_is_failure() {
        let backend = CommandBackend::from_config(&config(&["true"])).expect("backend");
        assert!(matches!(
            backend.complete("prompt"),
            Err(BackendError::EmptyResponse)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn unread_large_prompt_still_times_out() {
        let backend = CommandBackend::from_config(&BackendConfig {
            timeout_secs: 1,
            ..config(&["sh", "-c", "sleep 3; echo late"])
        })
        .expect("backend");

        let result = backend.complete(&"x".repeat(1_000_000));

        assert!(matches!(result, Err(BackendError::TimedOut(timeout)) if timeout.as_secs() == 1));
    }

    #[test]
    fn missing_program_is_process_error() {
        let backend = CommandBackend::from_config(&config(&["solus-no-such-program-xyz"]))
            .expect("backend");
        assert!(matches!(
            backend.complete("prompt"),
            Err(BackendError::Process(_))
        ));
    }
}
