//! Command-line interface for tunefetch.
//!
//! Commands download, inspect and dry-run catalog entities, and check the
//! external tools the pipeline depends on.

mod commands;

pub use commands::{Cli, Commands, run_command};
