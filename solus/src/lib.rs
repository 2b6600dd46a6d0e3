//! Deliberator/executor refactoring agent over a line-addressed text buffer.
//!
//! Two roles take turns against one buffer: a deliberator reasons in free text
//! about the next edit, and an executor answers with a single `INSERT`,
//! `DELETE` or `EDIT` command that is parsed and applied. The crate is split
//! the same way the work is:
//!
//! - **[`core`]**: Pure, deterministic logic (buffer, command grammar, parser,
//!   transcript). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (configuration files, child processes,
//!   completion backends).
//! - **[`agents`]**: Prompt rendering and the refactor loop that ties the two together.

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod report;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
