//! CLI module for aerokv
//!
//! Provides command-line interface for:
//! - check: Load model definitions and print the registry
//! - demo: Walk through every operation on the in-memory store

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, demo, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
