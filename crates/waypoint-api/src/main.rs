//! Waypoint developer CLI entry point.
//!
//! Binary name: `wpt`
//!
//! Inspects routine graphs and recovery strategy lookups without running a
//! full execution engine.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,waypoint_core=debug",
        _ => "trace",
    };
    if let Err(e) = waypoint_observe::tracing_setup::init_tracing(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    // Shell completions don't need engine state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "wpt", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await;

    let result = match cli.command {
        Commands::Graph { action } => cli::graph::handle_graph_command(action, &state, cli.json).await,
        Commands::Recovery { action } => {
            cli::recovery::handle_recovery_command(action, &state, cli.json)
        }
        Commands::Status => cli::status::status(&state, cli.json),
        Commands::Completions { .. } => Ok(()),
    };

    waypoint_observe::tracing_setup::shutdown_tracing();
    result
}
