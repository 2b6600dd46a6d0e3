//! Agent context: policy text plus the running transcript, rendered into
//! role-specific prompts.

use anyhow::Result;

use crate::agents::prompt::{Policy, PromptEngine, PromptState};
use crate::core::buffer::LineBuffer;
use crate::core::command::Command;
use crate::core::transcript::Transcript;

pub struct AgentContext {
    policy: Policy,
    transcript: Transcript,
    engine: PromptEngine,
}

impl AgentContext {
    pub fn new(policy: Policy) -> Result<Self> {
        Ok(Self {
            policy,
            transcript: Transcript::new(),
            engine: PromptEngine::new()?,
        })
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn append_deliberation(&mut self, message: impl Into<String>) {
        self.transcript.append_deliberation(message);
    }

    pub fn append_command(&mut self, command: Command) {
        self.transcript.append_command(command);
    }

    pub fn render_transcript(&self) -> String {
        self.transcript.render()
    }

    /// Deliberator prompt against the buffer as it is right now.
    pub fn render_deliberator_prompt(&self, buffer: &LineBuffer) -> Result<String> {
        let transcript = self.transcript.render();
        let view = buffer.view();
        self.engine.render_deliberator(
            &self.policy,
            PromptState {
                transcript: &transcript,
                resource_view: &view,
            },
        )
    }

    /// Executor prompt against the buffer as it is right now.
    pub fn render_executor_prompt(&self, buffer: &LineBuffer) -> Result<String> {
        let transcript = self.transcript.render();
        let view = buffer.view();
        self.engine.render_executor(
            &self.policy,
            PromptState {
                transcript: &transcript,
                resource_view: &view,
            },
        )
    }
}
