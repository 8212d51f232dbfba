//! Resilient strategy execution with ordered fallback.
//!
//! `StrategySelector::execute` runs the factory's primary strategy and, if
//! it fails, walks the configured fallback order until one succeeds. Every
//! failure mode below this boundary (a failed result, a returned error, a
//! panic) is converted into a `StrategyExecutionResult`; nothing is raised
//! to the caller.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use waypoint_types::config::EngineConfig;
use waypoint_types::strategy::{
    StrategyExecutionResult, StrategyStatistics, StrategySuggestion, StrategyType,
};

use super::context::ExecutionContext;
use super::factory::StrategyFactory;
use super::handler::{BoxStrategyHandler, StrategyError};

pub const NO_STRATEGY_ERROR: &str = "No suitable strategy found";
pub const ALL_FAILED_ERROR: &str = "All strategies failed";
pub const CANCELLED_ERROR: &str = "Execution cancelled";

/// Generic hints attached when every strategy has failed.
const EXHAUSTED_IMPROVEMENTS: [&str; 4] = [
    "Check the step configuration and inputs for errors",
    "Relax constraints.allowedStrategies so more fallbacks are eligible",
    "Grant models or tools so LLM-backed strategies can handle the step",
    "Split the step into smaller, more deterministic steps",
];

/// Orchestrates primary execution and the fallback chain for one step.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    factory: Arc<StrategyFactory>,
    fallback_order: Vec<StrategyType>,
}

impl StrategySelector {
    /// Selector using the default fallback order.
    pub fn new(factory: Arc<StrategyFactory>) -> Self {
        Self::with_fallback_order(factory, StrategyType::DEFAULT_FALLBACK_ORDER.to_vec())
    }

    /// Selector with an explicit fallback order. Duplicates are dropped,
    /// keeping the first occurrence.
    pub fn with_fallback_order(factory: Arc<StrategyFactory>, order: Vec<StrategyType>) -> Self {
        let mut fallback_order: Vec<StrategyType> = Vec::with_capacity(order.len());
        for strategy in order {
            if !fallback_order.contains(&strategy) {
                fallback_order.push(strategy);
            }
        }
        Self {
            factory,
            fallback_order,
        }
    }

    pub fn from_config(factory: Arc<StrategyFactory>, config: &EngineConfig) -> Self {
        Self::with_fallback_order(factory, config.fallback_order.clone())
    }

    pub fn fallback_order(&self) -> &[StrategyType] {
        &self.fallback_order
    }

    pub fn factory(&self) -> &Arc<StrategyFactory> {
        &self.factory
    }

    /// Execute the step described by `context`.
    ///
    /// Strategies run strictly one after another. `attempt_count` is
    /// incremented before each fallback attempt.
    pub async fn execute(&self, context: &mut ExecutionContext) -> StrategyExecutionResult {
        let started = Instant::now();

        if context.is_cancelled() {
            return finish(StrategyExecutionResult::failed(None, CANCELLED_ERROR), started);
        }

        let Some(primary) = self.factory.select_strategy(context) else {
            tracing::warn!(
                step_id = %context.step_id,
                step_type = %context.step_type,
                "No registered strategy can handle step"
            );
            let mut result = StrategyExecutionResult::failed(None, NO_STRATEGY_ERROR);
            result.metadata.fallback_used = true;
            return finish(result, started);
        };
        let primary_type = primary.strategy_type();

        let mut issues = Vec::new();
        match self.run(primary, context).await {
            Ok(mut result) if result.success => {
                result.metadata.fallback_used = false;
                return result;
            }
            Ok(result) => {
                let error = result.error.unwrap_or_else(|| "unspecified failure".to_string());
                tracing::warn!(
                    step_id = %context.step_id,
                    strategy = %primary_type,
                    error = %error,
                    "Primary strategy failed, trying fallbacks"
                );
                issues.push(format!("{primary_type}: {error}"));
            }
            Err(err) => {
                tracing::warn!(
                    step_id = %context.step_id,
                    strategy = %primary_type,
                    error = %err,
                    "Primary strategy raised an error, trying fallbacks"
                );
                issues.push(format!("{primary_type}: {err}"));
            }
        }

        let mut last_attempted = primary_type;
        for &candidate in &self.fallback_order {
            if candidate == primary_type {
                continue;
            }
            if !context.allows(candidate) {
                tracing::debug!(strategy = %candidate, "Fallback not in allowed strategies, skipping");
                continue;
            }
            let Some(handler) = self.factory.get(candidate) else {
                tracing::debug!(strategy = %candidate, "Fallback not registered, skipping");
                continue;
            };
            if !handler.can_handle(&context.step_type, &context.config) {
                tracing::debug!(strategy = %candidate, "Fallback cannot handle step, skipping");
                continue;
            }
            if context.is_cancelled() {
                tracing::info!(step_id = %context.step_id, "Execution cancelled during fallback");
                return finish(
                    StrategyExecutionResult::failed(Some(last_attempted), CANCELLED_ERROR),
                    started,
                );
            }

            context.attempt_count += 1;
            last_attempted = candidate;

            match self.run(handler, context).await {
                Ok(mut result) if result.success => {
                    tracing::info!(
                        step_id = %context.step_id,
                        primary = %primary_type,
                        strategy = %candidate,
                        "Fallback strategy succeeded"
                    );
                    result.metadata.fallback_used = true;
                    return result;
                }
                Ok(result) => {
                    let error = result.error.unwrap_or_else(|| "unspecified failure".to_string());
                    tracing::debug!(strategy = %candidate, error = %error, "Fallback strategy failed");
                    issues.push(format!("{candidate}: {error}"));
                }
                Err(err) => {
                    tracing::warn!(strategy = %candidate, error = %err, "Fallback strategy raised an error");
                    issues.push(format!("{candidate}: {err}"));
                }
            }
        }

        let mut result = StrategyExecutionResult::failed(Some(last_attempted), ALL_FAILED_ERROR);
        result.metadata.fallback_used = true;
        result.feedback.issues = issues;
        result.feedback.improvements = EXHAUSTED_IMPROVEMENTS.iter().map(|s| s.to_string()).collect();
        finish(result, started)
    }

    /// Run one handler with panic containment and statistics.
    async fn run(
        &self,
        handler: &BoxStrategyHandler,
        context: &ExecutionContext,
    ) -> Result<StrategyExecutionResult, StrategyError> {
        let strategy_type = handler.strategy_type();
        let started = Instant::now();

        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| handler.execute(context))) {
            Ok(future) => match AssertUnwindSafe(future).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => Err(StrategyError::Panicked(panic_message(payload))),
            },
            Err(payload) => Err(StrategyError::Panicked(panic_message(payload))),
        };

        let elapsed = started.elapsed();
        let success = matches!(&outcome, Ok(result) if result.success);
        self.factory.record_execution(strategy_type, success, elapsed);

        outcome.map(|mut result| {
            result.metadata.strategy_type = Some(strategy_type);
            result.metadata.execution_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            result
        })
    }

    /// Dry run: which strategy would run, and which fallbacks would follow.
    pub fn suggest_strategy(&self, context: &ExecutionContext) -> StrategySuggestion {
        let recommended = self.factory.find_strategy(context).map(|h| h.strategy_type());

        let alternatives: Vec<StrategyType> = self
            .fallback_order
            .iter()
            .copied()
            .filter(|&s| Some(s) != recommended)
            .filter(|&s| context.allows(s))
            .filter(|&s| {
                self.factory
                    .get(s)
                    .is_some_and(|h| h.can_handle(&context.step_type, &context.config))
            })
            .collect();

        let reasoning = explain(recommended, &alternatives, context);
        StrategySuggestion {
            recommended,
            alternatives,
            reasoning,
        }
    }

    pub fn statistics(&self) -> StrategyStatistics {
        self.factory.statistics()
    }

    pub fn reset(&self) {
        self.factory.reset();
    }
}

fn finish(mut result: StrategyExecutionResult, started: Instant) -> StrategyExecutionResult {
    result.metadata.execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    result
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn explain(
    recommended: Option<StrategyType>,
    alternatives: &[StrategyType],
    context: &ExecutionContext,
) -> String {
    let Some(strategy) = recommended else {
        return format!(
            "No registered strategy can handle '{}' steps",
            context.step_type
        );
    };

    let mut reasoning = match strategy {
        StrategyType::Deterministic if context.has_no_models() => format!(
            "DETERMINISTIC handles '{}' steps; no LLM resources required",
            context.step_type
        ),
        StrategyType::Deterministic => format!(
            "DETERMINISTIC handles '{}' steps; preferred over model calls even though models are available",
            context.step_type
        ),
        StrategyType::Conversational if context.has_no_models() => {
            "CONVERSATIONAL needs a language model but none is available".to_string()
        }
        StrategyType::Conversational => {
            "CONVERSATIONAL handles the step with a model conversation".to_string()
        }
        StrategyType::Reasoning => {
            let tools = context.resources.as_ref().map_or(0, |r| r.tools.len());
            format!("REASONING handles the step with multi-step reasoning over {tools} tool(s)")
        }
    };

    if alternatives.is_empty() {
        reasoning.push_str("; no fallbacks eligible");
    } else {
        let chain: Vec<&str> = alternatives.iter().map(|s| s.as_str()).collect();
        reasoning.push_str(&format!("; fallbacks: {}", chain.join(" -> ")));
    }
    reasoning
}
