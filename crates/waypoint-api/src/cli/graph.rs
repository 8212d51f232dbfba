//! Routine graph CLI commands: check, next, info.
//!
//! Loads a routine definition file (JSON or YAML), resolves a navigator
//! for it, and reports what the navigator sees.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::{Value, json};

use waypoint_core::navigator::Navigator;
use waypoint_infra::routine_file::load_routine_file;
use waypoint_types::routine::Location;

use crate::state::AppState;

/// Routine graph subcommands.
#[derive(Subcommand)]
pub enum GraphCommand {
    /// Validate a definition and show its start and end nodes.
    Check {
        /// Routine definition file (.json, .yaml, .yml).
        file: PathBuf,

        /// Routine identifier used as the navigator cache key.
        #[arg(long, default_value = "cli")]
        routine: String,
    },

    /// Show the locations reachable from a node for a runtime context.
    Next {
        file: PathBuf,

        #[arg(long, default_value = "cli")]
        routine: String,

        /// Current node ID.
        #[arg(long)]
        node: String,

        /// Runtime context as a JSON object.
        #[arg(long, default_value = "{}")]
        context: String,
    },

    /// Show step details, predecessors, and parallel branches of a node.
    Info {
        file: PathBuf,

        #[arg(long, default_value = "cli")]
        routine: String,

        #[arg(long)]
        node: String,
    },
}

/// Handle a routine graph subcommand.
pub async fn handle_graph_command(cmd: GraphCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        GraphCommand::Check { file, routine } => graph_check(state, &file, &routine, json).await,
        GraphCommand::Next {
            file,
            routine,
            node,
            context,
        } => graph_next(state, &file, &routine, &node, &context, json).await,
        GraphCommand::Info {
            file,
            routine,
            node,
        } => graph_info(state, &file, &routine, &node, json).await,
    }
}

/// Load `file`, pick a navigator, and cache the definition under `routine`.
async fn load(
    state: &AppState,
    file: &Path,
    routine: &str,
) -> Result<(Value, Arc<dyn Navigator>)> {
    let definition = load_routine_file(file)
        .await
        .with_context(|| format!("failed to load routine definition {}", file.display()))?;
    let navigator = state.navigators.resolve(&definition)?;
    navigator
        .validate_and_cache(routine, &definition)
        .with_context(|| format!("{} is not a valid routine graph", file.display()))?;
    Ok((definition, navigator))
}

/// Step IDs in definition order.
fn step_ids(definition: &Value) -> Vec<String> {
    definition
        .get("steps")
        .and_then(Value::as_array)
        .map(|steps| {
            steps
                .iter()
                .filter_map(|s| s.get("id").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn node_ids(locations: &[Location]) -> Vec<&str> {
    locations.iter().map(|l| l.node_id.as_str()).collect()
}

async fn graph_check(state: &AppState, file: &Path, routine: &str, json: bool) -> Result<()> {
    let (definition, navigator) = load(state, file, routine).await?;
    let start = navigator.start_location(routine, &definition)?;

    let steps = step_ids(&definition);
    let mut end_nodes = Vec::new();
    for step in &steps {
        if navigator.is_end_location(&Location::new(routine, step))? {
            end_nodes.push(step.clone());
        }
    }
    let edge_count = definition
        .get("edges")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    if json {
        let report = json!({
            "valid": true,
            "format": navigator.format(),
            "routineId": routine,
            "steps": steps.len(),
            "edges": edge_count,
            "startNodeId": start.node_id,
            "endNodeIds": end_nodes,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} is a valid {} routine graph",
        style("✓").green().bold(),
        style(file.display()).cyan(),
        navigator.format()
    );
    println!();
    println!("  Steps:  {}", style(steps.len()).bold());
    println!("  Edges:  {}", style(edge_count).bold());
    println!("  Start:  {}", style(&start.node_id).cyan());
    println!("  End:    {}", style(end_nodes.join(", ")).cyan());
    println!();

    Ok(())
}

async fn graph_next(
    state: &AppState,
    file: &Path,
    routine: &str,
    node: &str,
    context: &str,
    json: bool,
) -> Result<()> {
    let runtime_context: Value =
        serde_json::from_str(context).context("--context must be valid JSON")?;
    let (_, navigator) = load(state, file, routine).await?;

    let current = Location::new(routine, node);
    let next = navigator.next_locations(&current, &runtime_context)?;
    let is_end = navigator.is_end_location(&current)?;

    if json {
        let report = json!({
            "current": current,
            "next": next,
            "isEnd": is_end,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    if next.is_empty() {
        println!(
            "  {} No traversable edges from {}",
            style("i").blue().bold(),
            style(node).cyan()
        );
    } else {
        println!(
            "  {} -> {}",
            style(node).cyan(),
            style(node_ids(&next).join(", ")).green()
        );
    }
    if is_end {
        println!("  {}", style("This node ends the routine.").dim());
    }
    println!();

    Ok(())
}

async fn graph_info(
    state: &AppState,
    file: &Path,
    routine: &str,
    node: &str,
    json: bool,
) -> Result<()> {
    let (_, navigator) = load(state, file, routine).await?;

    let location = Location::new(routine, node);
    let info = navigator.step_info(&location)?;
    let dependencies = navigator.dependencies(&location)?;
    let is_end = navigator.is_end_location(&location)?;
    let branches = navigator.parallel_branches(&location)?;

    if json {
        let report = json!({
            "step": info,
            "dependencies": dependencies,
            "isEnd": is_end,
            "parallelBranches": branches,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} ({})",
        style(&info.name).bold(),
        style(info.step_type).dim()
    );
    if let Some(description) = &info.description {
        println!("  {}", style(description).dim());
    }
    println!();
    println!(
        "  Depends on: {}",
        if dependencies.is_empty() {
            "-".to_string()
        } else {
            dependencies.join(", ")
        }
    );
    println!("  End node:   {}", if is_end { "yes" } else { "no" });

    if !branches.is_empty() {
        println!();
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Branch").fg(Color::White),
            Cell::new("Path").fg(Color::White),
        ]);
        for (i, branch) in branches.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1).fg(Color::Cyan),
                Cell::new(node_ids(branch).join(" -> ")).fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
    }
    println!();

    Ok(())
}
