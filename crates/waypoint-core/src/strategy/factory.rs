//! Registry of execution strategies with usage statistics.

use std::time::Duration;

use dashmap::DashMap;
use waypoint_types::strategy::{StrategyStatistics, StrategyType, StrategyUsage};

use super::context::ExecutionContext;
use super::handler::BoxStrategyHandler;

/// Holds one handler per strategy type, in registration order.
///
/// Registration happens at startup through `&mut self`; afterwards the
/// factory is shared behind an `Arc` and only the usage counters change.
#[derive(Debug, Default)]
pub struct StrategyFactory {
    handlers: Vec<BoxStrategyHandler>,
    usage: DashMap<StrategyType, StrategyUsage>,
}

impl StrategyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A handler already registered for the same type
    /// is replaced in place, keeping its position in the match order.
    pub fn register(&mut self, handler: BoxStrategyHandler) {
        let strategy_type = handler.strategy_type();
        match self
            .handlers
            .iter_mut()
            .find(|h| h.strategy_type() == strategy_type)
        {
            Some(existing) => {
                tracing::debug!(strategy = %strategy_type, "Replacing registered strategy");
                *existing = handler;
            }
            None => self.handlers.push(handler),
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, handler: BoxStrategyHandler) -> Self {
        self.register(handler);
        self
    }

    /// Strategy types in match order.
    pub fn registered_types(&self) -> Vec<StrategyType> {
        self.handlers.iter().map(|h| h.strategy_type()).collect()
    }

    pub fn get(&self, strategy_type: StrategyType) -> Option<&BoxStrategyHandler> {
        self.handlers
            .iter()
            .find(|h| h.strategy_type() == strategy_type)
    }

    /// First registered handler whose `can_handle` accepts the context's
    /// step. Does not touch the statistics.
    pub fn find_strategy(&self, context: &ExecutionContext) -> Option<&BoxStrategyHandler> {
        self.handlers
            .iter()
            .find(|h| h.can_handle(&context.step_type, &context.config))
    }

    /// Like [`find_strategy`](Self::find_strategy), counting the selection.
    pub fn select_strategy(&self, context: &ExecutionContext) -> Option<&BoxStrategyHandler> {
        let selected = self.find_strategy(context)?;
        self.usage
            .entry(selected.strategy_type())
            .or_default()
            .selections += 1;
        Some(selected)
    }

    /// Record the outcome of one execution attempt.
    pub fn record_execution(&self, strategy_type: StrategyType, success: bool, elapsed: Duration) {
        let mut usage = self.usage.entry(strategy_type).or_default();
        usage.executions += 1;
        if success {
            usage.successes += 1;
        } else {
            usage.failures += 1;
        }
        usage.total_execution_time_ms += u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn statistics(&self) -> StrategyStatistics {
        StrategyStatistics {
            registered: self.registered_types(),
            usage: self
                .usage
                .iter()
                .map(|entry| (*entry.key(), entry.value().clone()))
                .collect(),
        }
    }

    /// Clear usage counters. Registered handlers are kept.
    pub fn reset(&self) {
        self.usage.clear();
    }
}
