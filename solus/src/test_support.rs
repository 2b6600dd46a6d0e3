//! Test-only helpers: scripted completion backends and temporary workspaces.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::buffer::LineBuffer;
use crate::io::backend::{BackendError, Completion};

/// Backend that replays predetermined replies in order and records every prompt.
///
/// Running out of replies is reported as [`BackendError::EmptyResponse`].
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<Result<String, BackendError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new<S: Into<String>>(replies: Vec<Result<S, BackendError>>) -> Self {
        Self {
            replies: RefCell::new(replies.into_iter().map(|r| r.map(Into::into)).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Backend whose every reply succeeds.
    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(*r)).collect())
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Completion for ScriptedBackend {
    fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(BackendError::EmptyResponse))
    }
}

/// Build a buffer from individual lines.
pub fn buffer_of(lines: &[&str]) -> LineBuffer {
    LineBuffer::from_text(&lines.join("\n"))
}

/// Temporary directory for CLI and config tests.
pub struct TempWorkspace {
    dir: tempfile::TempDir,
}

impl TempWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create tempdir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the workspace and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
