//! Deterministic, pure logic for the refactoring agent.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod buffer;
pub mod command;
pub mod parser;
pub mod transcript;
