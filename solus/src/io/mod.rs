//! Side-effecting helpers: configuration files, child processes, completion backends.

pub mod backend;
pub mod config;
pub mod process;
