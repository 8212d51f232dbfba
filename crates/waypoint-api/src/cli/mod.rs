//! CLI command definitions for the `wpt` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! engine component (`wpt graph ...`, `wpt recovery ...`).

pub mod graph;
pub mod recovery;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Inspect routine graphs and recovery strategies.
#[derive(Parser)]
#[command(name = "wpt", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and traverse routine graph definitions.
    Graph {
        #[command(subcommand)]
        action: graph::GraphCommand,
    },

    /// Look up recovery strategies for classified errors.
    Recovery {
        #[command(subcommand)]
        action: recovery::RecoveryCommand,
    },

    /// Show the effective engine configuration.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
