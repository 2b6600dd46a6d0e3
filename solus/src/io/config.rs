//! Session configuration stored in `solus.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::agents::prompt::Policy;
use crate::agents::session::DEFAULT_ITERATIONS;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "solus.toml";

/// Placeholder in `backend.command` replaced by `backend.model`.
pub const MODEL_PLACEHOLDER: &str = "{model}";

/// Top-level configuration (TOML).
///
/// Missing fields fall back to defaults, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SolusConfig {
    /// Deliberate/execute rounds per session.
    pub iterations: u32,

    pub backend: BackendConfig,

    pub policy: PolicyConfig,
}

/// How completions are obtained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BackendConfig {
    /// Program and arguments. The prompt is written to stdin, the reply is read
    /// from stdout. `{model}` is substituted with `model`.
    pub command: Vec<String>,

    pub model: String,

    /// Wall-clock limit for one completion call.
    pub timeout_secs: u64,

    /// Replies longer than this many bytes are cut off.
    pub output_limit_bytes: usize,
}

/// Optional overrides for the static prompt policy text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    pub guiding_principles: Option<String>,
    pub task: Option<String>,
    pub implementation_standards: Option<String>,
}

impl Default for SolusConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            backend: BackendConfig::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "llm".to_string(),
                "--model".to_string(),
                MODEL_PLACEHOLDER.to_string(),
            ],
            model: "gpt-4".to_string(),
            timeout_secs: 5 * 60,
            output_limit_bytes: 200_000,
        }
    }
}

impl BackendConfig {
    /// Command line with the model placeholder filled in.
    pub fn resolved_command(&self) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| arg.replace(MODEL_PLACEHOLDER, &self.model))
            .collect()
    }
}

impl PolicyConfig {
    /// Built-in policy with configured overrides applied.
    pub fn to_policy(&self) -> Policy {
        let mut policy = Policy::default();
        if let Some(text) = &self.guiding_principles {
            policy.guiding_principles = text.trim().to_string();
        }
        if let Some(text) = &self.task {
            policy.task = text.trim().to_string();
        }
        if let Some(text) = &self.implementation_standards {
            policy.implementation_standards = text.trim().to_string();
        }
        policy
    }
}

impl SolusConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(anyhow!("iterations must be > 0"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(anyhow!("backend.timeout_secs must be > 0"));
        }
        if self.backend.output_limit_bytes == 0 {
            return Err(anyhow!("backend.output_limit_bytes must be > 0"));
        }
        if self.backend.command.is_empty() || self.backend.command[0].trim().is_empty() {
            return Err(anyhow!("backend.command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SolusConfig::default()`.
pub fn load_config(path: &Path) -> Result<SolusConfig> {
    if !path.exists() {
        let cfg = SolusConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SolusConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SolusConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let tmp_path = path.with_extension("toml.tmp");
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(&tmp_path, buf).with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
