//! Recovery CLI commands: lookup, templates.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use waypoint_core::recovery::{RecoveryProvider, template_for};
use waypoint_core::strategy::ExecutionContext;
use waypoint_types::recovery::{
    BackoffType, ErrorCategory, ErrorClassification, RecoveryStrategyConfig,
    RecoveryStrategyType, Severity,
};

use crate::state::AppState;

/// Recovery subcommands.
#[derive(Subcommand)]
pub enum RecoveryCommand {
    /// Show the recovery strategy chosen for a classified error.
    Lookup {
        /// WARNING, ERROR, CRITICAL or FATAL.
        #[arg(long)]
        severity: Severity,

        /// SECURITY, TRANSIENT, RESOURCE, LOGIC, VALIDATION, CONFIGURATION,
        /// EXTERNAL or UNKNOWN. Other names map to UNKNOWN.
        #[arg(long)]
        category: ErrorCategory,

        /// Mark the error as a security risk.
        #[arg(long)]
        security_risk: bool,

        /// Attempts already made for the failing step.
        #[arg(long, default_value = "0")]
        attempt: u32,

        /// Step type of the failing step.
        #[arg(long, default_value = "action")]
        step_type: String,
    },

    /// List the canonical strategy templates.
    Templates,
}

/// Handle a recovery subcommand.
pub fn handle_recovery_command(cmd: RecoveryCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        RecoveryCommand::Lookup {
            severity,
            category,
            security_risk,
            attempt,
            step_type,
        } => {
            let mut classification = ErrorClassification::new(severity, category);
            classification.security_risk = security_risk;
            recovery_lookup(state, &classification, attempt, &step_type, json)
        }
        RecoveryCommand::Templates => recovery_templates(json),
    }
}

fn backoff_summary(config: &RecoveryStrategyConfig) -> String {
    let b = &config.backoff_strategy;
    match b.backoff_type {
        BackoffType::None => "none".to_string(),
        BackoffType::Fixed => format!("fixed {}ms", b.initial_delay_ms),
        BackoffType::Linear => format!("linear {}ms -> {}ms", b.initial_delay_ms, b.max_delay_ms),
        BackoffType::Exponential if b.jitter_percent > 0 => format!(
            "exponential {}ms -> {}ms ±{}%",
            b.initial_delay_ms, b.max_delay_ms, b.jitter_percent
        ),
        BackoffType::Exponential => {
            format!("exponential {}ms -> {}ms", b.initial_delay_ms, b.max_delay_ms)
        }
    }
}

fn recovery_lookup(
    state: &AppState,
    classification: &ErrorClassification,
    attempt: u32,
    step_type: &str,
    json: bool,
) -> Result<()> {
    let mut context = ExecutionContext::new("cli", step_type);
    context.attempt_count = attempt;
    let config = state.recovery.get_strategy(classification, &context);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} -> {}",
        style("→").blue().bold(),
        style(classification.lookup_key()).cyan(),
        style(config.strategy_type).green().bold()
    );
    println!();
    println!("  Max attempts:  {}", style(config.max_attempts).bold());
    println!("  Backoff:       {}", backoff_summary(&config));
    println!("  Priority:      {}", config.priority);
    println!("  Timeout:       {}ms", config.timeout_ms);
    println!(
        "  Success rate:  {:.0}%",
        config.estimated_success_rate * 100.0
    );
    println!("  Actions:       {}", config.fallback_actions.join(", "));
    if config.resource_requirements.human_intervention {
        println!("  {}", style("Requires human intervention.").yellow());
    }
    println!();

    Ok(())
}

fn recovery_templates(json: bool) -> Result<()> {
    let templates: Vec<RecoveryStrategyConfig> =
        RecoveryStrategyType::ALL.into_iter().map(template_for).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Recovery Strategy Templates").bold());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Strategy").fg(Color::White),
        Cell::new("Attempts").fg(Color::White),
        Cell::new("Backoff").fg(Color::White),
        Cell::new("Priority").fg(Color::White),
        Cell::new("Timeout").fg(Color::White),
    ]);

    for config in &templates {
        table.add_row(vec![
            Cell::new(config.strategy_type).fg(Color::Cyan),
            Cell::new(config.max_attempts).fg(Color::White),
            Cell::new(backoff_summary(config)).fg(Color::DarkGrey),
            Cell::new(config.priority).fg(Color::White),
            Cell::new(format!("{}ms", config.timeout_ms)).fg(Color::DarkGrey),
        ]);
    }

    println!("{table}");
    println!();

    Ok(())
}
