//! Engine configuration types.
//!
//! `EngineConfig` represents the `config.toml` that controls strategy
//! fallback order, event bus sizing, and the recovery adaptation rules.

use serde::{Deserialize, Serialize};

use crate::strategy::StrategyType;

/// Top-level engine configuration.
///
/// Loaded from `~/.waypoint/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Order in which strategies are tried after the primary fails.
    #[serde(default = "default_fallback_order")]
    pub fallback_order: Vec<StrategyType>,

    /// Capacity of the recovery event broadcast channel.
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    #[serde(default)]
    pub recovery: RecoveryTuning,
}

fn default_fallback_order() -> Vec<StrategyType> {
    StrategyType::DEFAULT_FALLBACK_ORDER.to_vec()
}

fn default_event_bus_capacity() -> usize {
    1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_order: default_fallback_order(),
            event_bus_capacity: default_event_bus_capacity(),
            recovery: RecoveryTuning::default(),
        }
    }
}

/// Parameters of the recovery provider's contextual adaptation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryTuning {
    /// Upper bound on `max_attempts` for CRITICAL errors, within
    /// `1..=RecoveryTuning::MAX_CRITICAL_ATTEMPTS`.
    #[serde(default = "default_critical_attempt_cap")]
    pub critical_attempt_cap: u32,

    /// Once `attempt_count` exceeds this, `max_attempts` is reduced by it.
    #[serde(default = "default_attempt_throttle_after")]
    pub attempt_throttle_after: u32,
}

fn default_critical_attempt_cap() -> u32 {
    2
}

fn default_attempt_throttle_after() -> u32 {
    2
}

impl RecoveryTuning {
    /// CRITICAL errors never get more attempts than this.
    pub const MAX_CRITICAL_ATTEMPTS: u32 = 2;

    /// Copy with `critical_attempt_cap` forced into `1..=MAX_CRITICAL_ATTEMPTS`.
    pub fn clamped(&self) -> Self {
        Self {
            critical_attempt_cap: self
                .critical_attempt_cap
                .clamp(1, Self::MAX_CRITICAL_ATTEMPTS),
            ..self.clone()
        }
    }
}

impl Default for RecoveryTuning {
    fn default() -> Self {
        Self {
            critical_attempt_cap: default_critical_attempt_cap(),
            attempt_throttle_after: default_attempt_throttle_after(),
        }
    }
}
