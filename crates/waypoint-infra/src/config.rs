//! Engine configuration loader.
//!
//! Reads `config.toml` from the config directory (`~/.waypoint/` in
//! production) and deserializes it into [`EngineConfig`]. Falls back to
//! defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use waypoint_types::config::EngineConfig;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "WAYPOINT_CONFIG_DIR";

/// Resolve the config directory.
///
/// Priority: `WAYPOINT_CONFIG_DIR`, then `~/.waypoint`, then `./.waypoint`.
pub fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".waypoint");
    }

    PathBuf::from(".waypoint")
}

/// Load engine configuration from `{config_dir}/config.toml`.
///
/// - Missing file: returns [`EngineConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - A zero `event_bus_capacity` is raised to 1 (the broadcast channel
///   cannot be empty).
/// - `recovery.critical_attempt_cap` is clamped to
///   `1..=RecoveryTuning::MAX_CRITICAL_ATTEMPTS`.
pub async fn load_engine_config(config_dir: &Path) -> EngineConfig {
    let config_path = config_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return EngineConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return EngineConfig::default();
        }
    };

    match toml::from_str::<EngineConfig>(&content) {
        Ok(mut config) => {
            if config.event_bus_capacity == 0 {
                tracing::warn!("event_bus_capacity = 0 in {}, using 1", config_path.display());
                config.event_bus_capacity = 1;
            }
            let tuning = config.recovery.clamped();
            if tuning != config.recovery {
                tracing::warn!(
                    "recovery.critical_attempt_cap = {} in {}, using {}",
                    config.recovery.critical_attempt_cap,
                    config_path.display(),
                    tuning.critical_attempt_cap
                );
                config.recovery = tuning;
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            EngineConfig::default()
        }
    }
}
