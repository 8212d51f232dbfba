//! Engine status command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display the effective engine configuration and registered navigators.
pub fn status(state: &AppState, json: bool) -> Result<()> {
    let config = &state.config;
    let formats = state.navigators.formats();
    let fallback: Vec<&str> = config.fallback_order.iter().map(|t| t.as_str()).collect();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "configDir": state.config_dir.display().to_string(),
            "navigators": formats,
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Waypoint v{}",
        style("◆").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  Config:        {}", style(state.config_dir.display()).dim());
    println!("  Navigators:    {}", style(formats.join(", ")).cyan());
    println!("  Fallback:      {}", style(fallback.join(" -> ")).cyan());
    println!("  Event bus:     {}", config.event_bus_capacity);
    println!(
        "  Recovery:      critical cap {}, throttle after {}",
        config.recovery.critical_attempt_cap, config.recovery.attempt_throttle_after
    );
    println!();

    Ok(())
}
