//! Application state wiring the engine components for CLI commands.

use std::path::PathBuf;

use waypoint_core::event::EventBus;
use waypoint_core::navigator::NavigatorRegistry;
use waypoint_core::recovery::SimpleRecoveryProvider;
use waypoint_infra::config::{load_engine_config, resolve_config_dir};
use waypoint_types::config::EngineConfig;

/// Engine components shared by all commands.
pub struct AppState {
    pub config_dir: PathBuf,
    pub config: EngineConfig,
    pub navigators: NavigatorRegistry,
    pub recovery: SimpleRecoveryProvider,
}

impl AppState {
    /// Load `config.toml` and build the navigator registry and recovery
    /// provider from it.
    pub async fn init() -> Self {
        let config_dir = resolve_config_dir();
        let config = load_engine_config(&config_dir).await;
        tracing::debug!(config_dir = %config_dir.display(), "Loaded engine config");

        let bus = EventBus::new(config.event_bus_capacity.max(1));
        let recovery = SimpleRecoveryProvider::with_tuning(bus, config.recovery.clone());

        Self {
            config_dir,
            config,
            navigators: NavigatorRegistry::with_native(),
            recovery,
        }
    }
}
