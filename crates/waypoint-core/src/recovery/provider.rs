//! Table-driven recovery strategy provider.
//!
//! Maps a classified failure plus its execution context to a recovery
//! config and reports every decision and outcome on the event bus. It holds
//! no learning state: adaptive tuning belongs to whoever consumes the events.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;
use waypoint_types::config::RecoveryTuning;
use waypoint_types::event::{ClassificationSummary, RecoveryEvent};
use waypoint_types::recovery::{
    ErrorClassification, RecoveryStrategyConfig, RecoveryStrategyType, Severity,
};

use super::templates::{StrategyTable, template_for};
use crate::event::EventBus;
use crate::strategy::ExecutionContext;

/// Selection reason attached to every table-driven decision.
pub const SELECTION_REASON: &str = "basic_lookup";

/// Source of recovery strategies for classified step failures.
pub trait RecoveryProvider: Send + Sync {
    /// Choose a recovery config for `classification` in `context`.
    fn get_strategy(
        &self,
        classification: &ErrorClassification,
        context: &ExecutionContext,
    ) -> RecoveryStrategyConfig;

    /// Report how an applied strategy turned out.
    fn record_outcome(
        &self,
        strategy_type: RecoveryStrategyType,
        classification: &ErrorClassification,
        context: &ExecutionContext,
        success: bool,
        duration: Duration,
        resource_cost: Value,
    );
}

/// Recovery provider backed by the static severity/category table.
#[derive(Debug, Clone)]
pub struct SimpleRecoveryProvider {
    table: StrategyTable,
    tuning: RecoveryTuning,
    bus: EventBus,
}

impl SimpleRecoveryProvider {
    /// Provider with the default adaptation rules.
    pub fn new(bus: EventBus) -> Self {
        Self::with_tuning(bus, RecoveryTuning::default())
    }

    /// Provider with custom adaptation rules. `critical_attempt_cap` is
    /// clamped to `1..=RecoveryTuning::MAX_CRITICAL_ATTEMPTS`.
    pub fn with_tuning(bus: EventBus, tuning: RecoveryTuning) -> Self {
        let clamped = tuning.clamped();
        if clamped != tuning {
            tracing::warn!(
                requested = tuning.critical_attempt_cap,
                applied = clamped.critical_attempt_cap,
                "critical_attempt_cap out of range, clamping"
            );
        }
        Self {
            table: StrategyTable::new(),
            tuning: clamped,
            bus,
        }
    }

    /// The bus decisions and outcomes are published on.
    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Resolve and adapt a config without publishing anything.
    ///
    /// Returns the lookup key alongside the config.
    pub fn lookup(
        &self,
        classification: &ErrorClassification,
        context: &ExecutionContext,
    ) -> (String, RecoveryStrategyConfig) {
        let (key, strategy_type) = self.table.resolve(classification);
        let mut config = template_for(strategy_type);
        self.adapt(&mut config, classification, context.attempt_count);
        (key, config)
    }

    /// The only two context-sensitive rules: CRITICAL errors get a hard
    /// attempt cap, and repeated attempts shrink the remaining budget.
    fn adapt(
        &self,
        config: &mut RecoveryStrategyConfig,
        classification: &ErrorClassification,
        attempt_count: u32,
    ) {
        if classification.severity == Severity::Critical {
            config.max_attempts = config
                .max_attempts
                .min(self.tuning.critical_attempt_cap)
                .max(1);
        }
        if attempt_count > self.tuning.attempt_throttle_after {
            config.max_attempts = config.max_attempts.saturating_sub(attempt_count).max(1);
        }
    }
}

fn summarize(classification: &ErrorClassification) -> ClassificationSummary {
    ClassificationSummary {
        severity: classification.severity,
        category: classification.category,
        security_risk: classification.security_risk,
    }
}

impl RecoveryProvider for SimpleRecoveryProvider {
    fn get_strategy(
        &self,
        classification: &ErrorClassification,
        context: &ExecutionContext,
    ) -> RecoveryStrategyConfig {
        let (lookup_key, config) = self.lookup(classification, context);

        tracing::debug!(
            step_id = %context.step_id,
            lookup_key = %lookup_key,
            strategy = %config.strategy_type,
            max_attempts = config.max_attempts,
            "Selected recovery strategy"
        );

        self.bus.publish(RecoveryEvent::StrategySelected {
            event_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            classification: summarize(classification),
            context: context.summary(),
            strategy_type: config.strategy_type,
            lookup_key,
            selection_reason: SELECTION_REASON.to_string(),
        });

        config
    }

    fn record_outcome(
        &self,
        strategy_type: RecoveryStrategyType,
        classification: &ErrorClassification,
        context: &ExecutionContext,
        success: bool,
        duration: Duration,
        resource_cost: Value,
    ) {
        self.bus.publish(RecoveryEvent::Outcome {
            event_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            strategy_type,
            classification: summarize(classification),
            context: context.summary(),
            success,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            resource_cost,
        });
    }
}
