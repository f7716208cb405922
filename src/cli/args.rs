//! CLI argument definitions using clap
//!
//! Commands:
//! - aerokv check --models <path>
//! - aerokv demo [--models <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aerokv - schema-driven queries over an ordered key-value store
#[derive(Parser, Debug)]
#[command(name = "aerokv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load model definitions and print each collection
    Check {
        /// Model definition file, or a directory of *.json files
        #[arg(long)]
        models: PathBuf,
    },

    /// Run a users/orders walkthrough against the in-memory store
    Demo {
        /// Model definitions to use instead of the built-in users/orders
        #[arg(long)]
        models: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
