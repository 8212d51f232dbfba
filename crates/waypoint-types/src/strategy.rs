//! Execution strategy types: strategy kinds, execution results, and
//! the explainability output of a dry-run suggestion.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// StrategyType
// ---------------------------------------------------------------------------

/// The closed set of execution strategy kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyType {
    /// Rule-driven execution with no model calls.
    Deterministic,
    /// Single LLM conversation turn(s).
    Conversational,
    /// Multi-step LLM reasoning with tools.
    Reasoning,
}

impl StrategyType {
    /// Cheapest and most predictable first.
    pub const DEFAULT_FALLBACK_ORDER: [StrategyType; 3] = [
        StrategyType::Deterministic,
        StrategyType::Conversational,
        StrategyType::Reasoning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Deterministic => "DETERMINISTIC",
            StrategyType::Conversational => "CONVERSATIONAL",
            StrategyType::Reasoning => "REASONING",
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Context payloads
// ---------------------------------------------------------------------------

/// Resources available to a step execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResources {
    /// Model identifiers the step may call. Empty means no LLM access.
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<u64>,
}

/// Caller-imposed limits on how a step may execute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConstraints {
    /// When set, only these strategy types may run as fallbacks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_strategies: Option<Vec<StrategyType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_execution_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<u64>,
}

impl ExecutionConstraints {
    /// Whether `strategy` passes the allow-list (always true when unset).
    pub fn allows(&self, strategy: StrategyType) -> bool {
        self.allowed_strategies
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&strategy))
    }
}

// ---------------------------------------------------------------------------
// StrategyExecutionResult
// ---------------------------------------------------------------------------

/// Terminal output of one step execution. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Step outputs produced by the strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    pub metadata: ExecutionMetadata,
    pub feedback: ExecutionFeedback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    /// The strategy that produced this result. `None` when no strategy ran.
    pub strategy_type: Option<StrategyType>,
    pub execution_time_ms: u64,
    pub resource_usage: ResourceUsage,
    /// Confidence in the outcome, 0.0..=1.0.
    pub confidence: f64,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub api_calls: u32,
    #[serde(default)]
    pub credits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFeedback {
    pub outcome: ExecutionOutcome,
    /// 0.0..=1.0
    pub performance_score: f64,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improvements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success,
    Partial,
    Failure,
}

impl StrategyExecutionResult {
    /// A successful result attributed to `strategy`.
    pub fn succeeded(strategy: StrategyType, outputs: Option<Value>, confidence: f64) -> Self {
        Self {
            success: true,
            error: None,
            outputs,
            metadata: ExecutionMetadata {
                strategy_type: Some(strategy),
                execution_time_ms: 0,
                resource_usage: ResourceUsage::default(),
                confidence,
                fallback_used: false,
            },
            feedback: ExecutionFeedback {
                outcome: ExecutionOutcome::Success,
                performance_score: confidence,
                issues: Vec::new(),
                improvements: Vec::new(),
            },
        }
    }

    /// A failed result. `strategy` is `None` when no strategy ran at all.
    pub fn failed(strategy: Option<StrategyType>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            error: Some(error.clone()),
            outputs: None,
            metadata: ExecutionMetadata {
                strategy_type: strategy,
                execution_time_ms: 0,
                resource_usage: ResourceUsage::default(),
                confidence: 0.0,
                fallback_used: false,
            },
            feedback: ExecutionFeedback {
                outcome: ExecutionOutcome::Failure,
                performance_score: 0.0,
                issues: vec![error],
                improvements: Vec::new(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Suggestion (dry run)
// ---------------------------------------------------------------------------

/// Explainability output of a dry-run strategy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySuggestion {
    pub recommended: Option<StrategyType>,
    /// Eligible fallbacks, in the order they would be tried.
    pub alternatives: Vec<StrategyType>,
    pub reasoning: String,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Usage counters for one strategy type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyUsage {
    /// Times chosen as primary strategy.
    pub selections: u64,
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_execution_time_ms: u64,
}

impl StrategyUsage {
    pub fn success_rate(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.successes as f64 / self.executions as f64
        }
    }

    pub fn average_execution_time_ms(&self) -> f64 {
        if self.executions == 0 {
            0.0
        } else {
            self.total_execution_time_ms as f64 / self.executions as f64
        }
    }
}

/// Snapshot of factory-wide strategy usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyStatistics {
    pub registered: Vec<StrategyType>,
    pub usage: HashMap<StrategyType, StrategyUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constraints_allow_all_when_unset() {
        let c = ExecutionConstraints::default();
        for s in StrategyType::DEFAULT_FALLBACK_ORDER {
            assert!(c.allows(s));
        }
    }

    #[test]
    fn test_constraints_allow_list() {
        let c = ExecutionConstraints {
            allowed_strategies: Some(vec![StrategyType::Reasoning]),
            ..Default::default()
        };
        assert!(c.allows(StrategyType::Reasoning));
        assert!(!c.allows(StrategyType::Conversational));
    }

    #[test]
    fn test_failed_result_shape() {
        let r = StrategyExecutionResult::failed(None, "No suitable strategy found");
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("No suitable strategy found"));
        assert_eq!(r.metadata.confidence, 0.0);
        assert_eq!(r.feedback.outcome, ExecutionOutcome::Failure);
        assert_eq!(r.feedback.issues, vec!["No suitable strategy found".to_string()]);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let r = StrategyExecutionResult::succeeded(
            StrategyType::Deterministic,
            Some(json!({ "rows": 3 })),
            0.9,
        );
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["metadata"]["strategyType"], json!("DETERMINISTIC"));
        assert_eq!(v["metadata"]["fallbackUsed"], json!(false));
        assert_eq!(v["feedback"]["outcome"], json!("success"));
        assert!(v["feedback"].get("improvements").is_none());
    }

    #[test]
    fn test_usage_rates() {
        let usage = StrategyUsage {
            selections: 4,
            executions: 4,
            successes: 3,
            failures: 1,
            total_execution_time_ms: 200,
        };
        assert!((usage.success_rate() - 0.75).abs() < f64::EPSILON);
        assert!((usage.average_execution_time_ms() - 50.0).abs() < f64::EPSILON);
        assert_eq!(StrategyUsage::default().success_rate(), 0.0);
    }
}
