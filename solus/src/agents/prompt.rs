//! Prompt templates for the deliberator and executor roles.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

const DELIBERATOR_TEMPLATE: &str = include_str!("prompts/deliberator.md");
const EXECUTOR_TEMPLATE: &str = include_str!("prompts/executor.md");

/// Reference for the command grammar, embedded in executor prompts only.
pub const COMMAND_REFERENCE: &str = include_str!("prompts/commands.md");

const DEFAULT_GUIDING_PRINCIPLES: &str = "\
Core Values
1. Focus on the user, and all else will follow.
2. Embrace risk to compound success.
3. Integrity and transparency build longevity.
4. Health is wealth.";

const DEFAULT_TASK: &str = "\
Role: Refactoring agent.
Goal: Optimize code with idiomatic practices, guiding principles, and performance constraints.";

const DEFAULT_IMPLEMENTATION_STANDARDS: &str = "Follow Robert C. Martin's clean code practices.";

/// Static policy text shared by both roles for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub guiding_principles: String,
    pub task: String,
    pub implementation_standards: String,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            guiding_principles: DEFAULT_GUIDING_PRINCIPLES.to_string(),
            task: DEFAULT_TASK.to_string(),
            implementation_standards: DEFAULT_IMPLEMENTATION_STANDARDS.to_string(),
        }
    }
}

/// Live inputs that change between renders.
#[derive(Debug, Clone, Copy)]
pub struct PromptState<'a> {
    pub transcript: &'a str,
    pub resource_view: &'a str,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("deliberator", DELIBERATOR_TEMPLATE)
            .context("load deliberator template")?;
        env.add_template("executor", EXECUTOR_TEMPLATE)
            .context("load executor template")?;
        Ok(Self { env })
    }

    pub fn render_deliberator(&self, policy: &Policy, state: PromptState<'_>) -> Result<String> {
        let template = self.env.get_template("deliberator")?;
        let rendered = template
            .render(context! {
                principles => policy.guiding_principles.trim(),
                task => policy.task.trim(),
                standards => policy.implementation_standards.trim(),
                transcript => state.transcript.trim_end(),
                resource_view => state.resource_view.trim_end(),
            })
            .context("render deliberator prompt")?;
        Ok(rendered)
    }

    pub fn render_executor(&self, policy: &Policy, state: PromptState<'_>) -> Result<String> {
        let template = self.env.get_template("executor")?;
        let rendered = template
            .render(context! {
                task => policy.task.trim(),
                standards => policy.implementation_standards.trim(),
                commands => COMMAND_REFERENCE.trim(),
                transcript => state.transcript.trim_end(),
                resource_view => state.resource_view.trim_end(),
            })
            .context("render executor prompt")?;
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PromptState<'static> {
        PromptState {
            transcript: "DELIBERATOR: rename the function\n",
            resource_view: "1|def addAndReverse(a, b, alist):\n",
        }
    }

    /// Verifies sections appear in a fixed order.
    ///
    /// Order matters for prompt consistency: role -> principles -> task ->
    /// standards -> ephemeral context -> resource view.
    #[test]
    fn deliberator_sections_are_ordered() {
        let engine = PromptEngine::new().expect("engine");
        let prompt = engine
            .render_deliberator(&Policy::default(), state())
            .expect("render");

        let role = prompt.find("You are the deliberator").expect("role");
        let principles = prompt.find("Core Values").expect("principles");
        let task = prompt.find("Role: Refactoring agent.").expect("task");
        let standards = prompt.find("clean code").expect("standards");
        let context = prompt.find("DELIBERATOR: rename").expect("transcript");
        let view = prompt.find("1|def addAndReverse").expect("view");

        assert!(role < principles);
        assert!(principles < task);
        assert!(task < standards);
        assert!(standards < context);
        assert!(context < view);
        assert!(!prompt.contains("INSERT COMMAND"));
    }

    #[test]
    fn executor_prompt_embeds_command_reference() {
        let engine = PromptEngine::new().expect("engine");
        let prompt = engine
            .render_executor(&Policy::default(), state())
            .expect("render");

        assert!(prompt.starts_with("You are the executor"));
        assert!(prompt.contains("INSERT COMMAND"));
        assert!(prompt.contains("DELETE <start_line> <optional: end_line> END"));
        assert!(!prompt.contains("Core Values"));
        assert!(prompt.ends_with("1|def addAndReverse(a, b, alist):"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let engine = PromptEngine::new().expect("engine");
        let policy = Policy::default();
        let first = engine.render_executor(&policy, state()).expect("first");
        let second = engine.render_executor(&policy, state()).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn values_are_not_html_escaped() {
        let engine = PromptEngine::new().expect("engine");
        let prompt = engine
            .render_deliberator(
                &Policy::default(),
                PromptState {
                    transcript: "",
                    resource_view: "1|if a < b && c > d:",
                },
            )
            .expect("render");
        assert!(prompt.contains("1|if a < b && c > d:"));
    }
}
