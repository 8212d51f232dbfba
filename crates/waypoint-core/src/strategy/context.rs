//! Per-attempt execution context handed to strategies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use waypoint_types::event::ContextSummary;
use waypoint_types::strategy::{ExecutionConstraints, ExecutionResources, StrategyType};

/// Everything a strategy needs to decide applicability and run one step.
///
/// Created per step execution and discarded once the step completes. The
/// selector only ever mutates `attempt_count`, and only between attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub step_id: String,
    /// Step kind as authored (e.g. "action", "decision").
    pub step_type: String,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ExecutionResources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ExecutionConstraints>,
    /// External abort signal. Strategies should poll it during long work.
    #[serde(skip)]
    pub cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn new(step_id: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            step_type: step_type.into(),
            ..Self::default()
        }
    }

    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_resources(mut self, resources: ExecutionResources) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn with_constraints(mut self, constraints: ExecutionConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Whether the caller's allow-list (if any) permits `strategy`.
    pub fn allows(&self, strategy: StrategyType) -> bool {
        self.constraints
            .as_ref()
            .is_none_or(|c| c.allows(strategy))
    }

    /// True when the context grants no model access.
    pub fn has_no_models(&self) -> bool {
        self.resources
            .as_ref()
            .is_none_or(|r| r.models.is_empty())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Compact projection carried on recovery events.
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            step_id: self.step_id.clone(),
            step_type: self.step_type.clone(),
            tier: self.tier.clone(),
            component: self.component.clone(),
            attempt_count: self.attempt_count,
        }
    }
}
