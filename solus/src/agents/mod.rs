//! Deliberator/executor agent: prompt rendering and the refactor loop.

pub mod context;
pub mod prompt;
pub mod session;
