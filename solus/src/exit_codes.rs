//! Stable exit codes for solus CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid input, config, or other errors.
pub const INVALID: i32 = 1;
/// `solus parse` / `solus apply` found no command in the response.
pub const NO_COMMAND: i32 = 2;
/// `solus apply` parsed a command that does not fit the file.
pub const OUT_OF_RANGE: i32 = 3;
