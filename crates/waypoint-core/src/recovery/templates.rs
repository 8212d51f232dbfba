//! Canonical recovery strategy templates and the static lookup table.
//!
//! The table maps `"{SEVERITY}:{CATEGORY}"` keys to one of the seven
//! template shapes. Every lookup hands out a fresh `RecoveryStrategyConfig`.

use std::collections::HashMap;

use waypoint_types::recovery::{
    BackoffStrategy, BackoffType, ErrorClassification, RecoveryStrategyConfig,
    RecoveryStrategyType, ResourceRequirements, Severity,
};

/// Explicit severity/category pairings. Anything not listed falls through
/// to [`default_strategy_type`].
const TABLE: &[(&str, RecoveryStrategyType)] = &[
    ("WARNING:TRANSIENT", RecoveryStrategyType::RetrySame),
    ("ERROR:TRANSIENT", RecoveryStrategyType::WaitAndRetry),
    ("CRITICAL:TRANSIENT", RecoveryStrategyType::WaitAndRetry),
    ("WARNING:RESOURCE", RecoveryStrategyType::WaitAndRetry),
    ("ERROR:RESOURCE", RecoveryStrategyType::ReduceScope),
    ("CRITICAL:RESOURCE", RecoveryStrategyType::ReduceScope),
    ("WARNING:LOGIC", RecoveryStrategyType::RetryModified),
    ("ERROR:LOGIC", RecoveryStrategyType::FallbackStrategy),
    ("CRITICAL:LOGIC", RecoveryStrategyType::EscalateToHuman),
    ("WARNING:SECURITY", RecoveryStrategyType::EscalateToHuman),
    ("ERROR:SECURITY", RecoveryStrategyType::EscalateToHuman),
    ("CRITICAL:SECURITY", RecoveryStrategyType::EscalateToHuman),
    ("FATAL:SECURITY", RecoveryStrategyType::EmergencyStop),
    ("ERROR:VALIDATION", RecoveryStrategyType::RetryModified),
    ("ERROR:CONFIGURATION", RecoveryStrategyType::EscalateToHuman),
    ("ERROR:EXTERNAL", RecoveryStrategyType::FallbackStrategy),
];

/// Immutable key -> strategy table, built once per provider.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    entries: HashMap<&'static str, RecoveryStrategyType>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self {
            entries: TABLE.iter().copied().collect(),
        }
    }

    /// Explicit entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<RecoveryStrategyType> {
        self.entries.get(key).copied()
    }

    /// Strategy for a classification: explicit entry first, defaults second.
    ///
    /// Returns the lookup key alongside so callers can report it.
    pub fn resolve(&self, classification: &ErrorClassification) -> (String, RecoveryStrategyType) {
        let key = classification.lookup_key();
        let strategy = self
            .get(&key)
            .unwrap_or_else(|| default_strategy_type(classification));
        (key, strategy)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback rule for unlisted keys.
///
/// FATAL/CRITICAL stop, a flagged security risk escalates, everything else
/// retries.
pub fn default_strategy_type(classification: &ErrorClassification) -> RecoveryStrategyType {
    match classification.severity {
        Severity::Fatal | Severity::Critical => RecoveryStrategyType::EmergencyStop,
        _ if classification.security_risk => RecoveryStrategyType::EscalateToHuman,
        _ => RecoveryStrategyType::RetrySame,
    }
}

fn backoff(
    backoff_type: BackoffType,
    initial_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: f64,
    jitter_percent: u8,
) -> BackoffStrategy {
    BackoffStrategy {
        backoff_type,
        initial_delay_ms,
        max_delay_ms,
        multiplier,
        jitter_percent,
        adaptive_adjustment: true,
    }
}

/// A fresh copy of the canonical template for `strategy_type`.
pub fn template_for(strategy_type: RecoveryStrategyType) -> RecoveryStrategyConfig {
    let (max_attempts, backoff_strategy, fallback_actions, priority, timeout_ms, conditions, rate, resources) =
        match strategy_type {
            RecoveryStrategyType::EmergencyStop => (
                1,
                BackoffStrategy::none(),
                vec!["halt_routine", "notify_operator"],
                10,
                1_000,
                vec!["immediate"],
                1.0,
                ResourceRequirements {
                    compute_units: 0.1,
                    human_intervention: true,
                },
            ),
            RecoveryStrategyType::EscalateToHuman => (
                1,
                BackoffStrategy::none(),
                vec!["pause_routine", "request_review"],
                9,
                5_000,
                vec!["human_available"],
                0.9,
                ResourceRequirements {
                    compute_units: 0.2,
                    human_intervention: true,
                },
            ),
            RecoveryStrategyType::RetrySame => (
                3,
                backoff(BackoffType::Exponential, 100, 5_000, 2.0, 0),
                vec!["retry_step"],
                5,
                10_000,
                vec!["idempotent_step"],
                0.6,
                ResourceRequirements {
                    compute_units: 1.0,
                    human_intervention: false,
                },
            ),
            RecoveryStrategyType::WaitAndRetry => (
                3,
                backoff(BackoffType::Exponential, 1_000, 30_000, 2.0, 20),
                vec!["wait", "retry_step"],
                6,
                60_000,
                vec!["transient_condition"],
                0.7,
                ResourceRequirements {
                    compute_units: 1.0,
                    human_intervention: false,
                },
            ),
            RecoveryStrategyType::ReduceScope => (
                1,
                BackoffStrategy::none(),
                vec!["reduce_batch_size", "drop_optional_inputs"],
                4,
                15_000,
                vec!["scope_reducible"],
                0.5,
                ResourceRequirements {
                    compute_units: 0.5,
                    human_intervention: false,
                },
            ),
            RecoveryStrategyType::FallbackStrategy => (
                1,
                BackoffStrategy::none(),
                vec!["switch_strategy"],
                5,
                30_000,
                vec!["alternative_available"],
                0.55,
                ResourceRequirements {
                    compute_units: 1.5,
                    human_intervention: false,
                },
            ),
            RecoveryStrategyType::RetryModified => (
                2,
                backoff(BackoffType::Linear, 500, 10_000, 1.0, 0),
                vec!["adjust_inputs", "retry_step"],
                6,
                20_000,
                vec!["inputs_adjustable"],
                0.65,
                ResourceRequirements {
                    compute_units: 1.2,
                    human_intervention: false,
                },
            ),
        };

    RecoveryStrategyConfig {
        strategy_type,
        max_attempts,
        backoff_strategy,
        fallback_actions: fallback_actions.into_iter().map(String::from).collect(),
        priority,
        timeout_ms,
        conditions: conditions.into_iter().map(String::from).collect(),
        estimated_success_rate: rate,
        resource_requirements: resources,
    }
}
