//! Events emitted by the recovery provider for external learning consumers.
//!
//! Each event serializes to a JSON object tagged with its event name:
//! `recovery/strategy_selected` or `recovery/outcome`. All variants are
//! Clone + Send + Sync for use with tokio broadcast channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::recovery::{ErrorCategory, RecoveryStrategyType, Severity};

/// Compact view of an error classification carried on events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSummary {
    pub severity: Severity,
    pub category: ErrorCategory,
    pub security_risk: bool,
}

/// Compact view of an execution context carried on events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    pub step_id: String,
    pub step_type: String,
    pub tier: String,
    pub component: String,
    pub attempt_count: u32,
}

/// Recovery telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RecoveryEvent {
    /// A strategy was chosen for a classified error.
    #[serde(rename = "recovery/strategy_selected", rename_all = "camelCase")]
    StrategySelected {
        event_id: Uuid,
        timestamp: DateTime<Utc>,
        classification: ClassificationSummary,
        context: ContextSummary,
        strategy_type: RecoveryStrategyType,
        lookup_key: String,
        selection_reason: String,
    },

    /// The caller reported how an applied strategy turned out.
    #[serde(rename = "recovery/outcome", rename_all = "camelCase")]
    Outcome {
        event_id: Uuid,
        timestamp: DateTime<Utc>,
        strategy_type: RecoveryStrategyType,
        classification: ClassificationSummary,
        context: ContextSummary,
        success: bool,
        duration_ms: u64,
        resource_cost: Value,
    },
}

impl RecoveryEvent {
    pub const STRATEGY_SELECTED: &'static str = "recovery/strategy_selected";
    pub const OUTCOME: &'static str = "recovery/outcome";

    /// The bus-level event name.
    pub fn name(&self) -> &'static str {
        match self {
            RecoveryEvent::StrategySelected { .. } => Self::STRATEGY_SELECTED,
            RecoveryEvent::Outcome { .. } => Self::OUTCOME,
        }
    }
}
