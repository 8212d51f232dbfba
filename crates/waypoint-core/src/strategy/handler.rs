//! Strategy handler trait and its object-safe wrapper.
//!
//! Same blanket-impl pattern as the rest of the crate's async seams:
//! 1. `StrategyHandler` uses RPITIT for `execute`
//! 2. `StrategyHandlerDyn` boxes the future and is blanket-implemented
//! 3. `BoxStrategyHandler` wraps `Box<dyn StrategyHandlerDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use waypoint_types::strategy::{StrategyExecutionResult, StrategyType};

use super::context::ExecutionContext;

/// Error returned by a strategy that could not run to a result.
///
/// A strategy that ran and failed returns `Ok` with `success: false`;
/// this type is for the cases where no result could be produced.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StrategyError {
    #[error("strategy execution failed: {0}")]
    ExecutionFailed(String),

    #[error("required resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("strategy timed out after {0} ms")]
    Timeout(u64),

    #[error("strategy panicked: {0}")]
    Panicked(String),
}

/// A pluggable execution strategy for one `StrategyType`.
pub trait StrategyHandler: Send + Sync {
    fn strategy_type(&self) -> StrategyType;

    /// Whether this strategy applies to a step of `step_type` with `config`.
    fn can_handle(&self, step_type: &str, config: &Value) -> bool;

    /// Execute the step described by `context`.
    fn execute(
        &self,
        context: &ExecutionContext,
    ) -> impl Future<Output = Result<StrategyExecutionResult, StrategyError>> + Send;
}

/// Object-safe version of [`StrategyHandler`] with a boxed future.
pub trait StrategyHandlerDyn: Send + Sync {
    fn strategy_type(&self) -> StrategyType;

    fn can_handle(&self, step_type: &str, config: &Value) -> bool;

    fn execute_boxed<'a>(
        &'a self,
        context: &'a ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<StrategyExecutionResult, StrategyError>> + Send + 'a>>;
}

impl<T: StrategyHandler> StrategyHandlerDyn for T {
    fn strategy_type(&self) -> StrategyType {
        StrategyHandler::strategy_type(self)
    }

    fn can_handle(&self, step_type: &str, config: &Value) -> bool {
        StrategyHandler::can_handle(self, step_type, config)
    }

    fn execute_boxed<'a>(
        &'a self,
        context: &'a ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<StrategyExecutionResult, StrategyError>> + Send + 'a>> {
        Box::pin(self.execute(context))
    }
}

/// Type-erased strategy handler, registered with the `StrategyFactory`.
pub struct BoxStrategyHandler {
    inner: Box<dyn StrategyHandlerDyn>,
}

impl BoxStrategyHandler {
    pub fn new<T: StrategyHandler + 'static>(handler: T) -> Self {
        Self {
            inner: Box::new(handler),
        }
    }

    pub fn strategy_type(&self) -> StrategyType {
        self.inner.strategy_type()
    }

    pub fn can_handle(&self, step_type: &str, config: &Value) -> bool {
        self.inner.can_handle(step_type, config)
    }

    /// Start executing. Returns the future rather than awaiting it so the
    /// caller can contain panics raised while the future is being built.
    pub fn execute<'a>(
        &'a self,
        context: &'a ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<StrategyExecutionResult, StrategyError>> + Send + 'a>> {
        self.inner.execute_boxed(context)
    }
}

impl std::fmt::Debug for BoxStrategyHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxStrategyHandler")
            .field("strategy_type", &self.strategy_type())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// FnStrategy
// ---------------------------------------------------------------------------

/// Closure-backed strategy: an applicability predicate plus an execution
/// closure. The execution closure receives an owned copy of the context.
pub struct FnStrategy<C, E> {
    strategy_type: StrategyType,
    can_handle: C,
    execute: E,
}

impl<C, E, Fut> FnStrategy<C, E>
where
    C: Fn(&str, &Value) -> bool + Send + Sync,
    E: Fn(ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StrategyExecutionResult, StrategyError>> + Send + 'static,
{
    pub fn new(strategy_type: StrategyType, can_handle: C, execute: E) -> Self {
        Self {
            strategy_type,
            can_handle,
            execute,
        }
    }
}

impl<C, E, Fut> StrategyHandler for FnStrategy<C, E>
where
    C: Fn(&str, &Value) -> bool + Send + Sync,
    E: Fn(ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StrategyExecutionResult, StrategyError>> + Send + 'static,
{
    fn strategy_type(&self) -> StrategyType {
        self.strategy_type
    }

    fn can_handle(&self, step_type: &str, config: &Value) -> bool {
        (self.can_handle)(step_type, config)
    }

    fn execute(
        &self,
        context: &ExecutionContext,
    ) -> impl Future<Output = Result<StrategyExecutionResult, StrategyError>> + Send {
        (self.execute)(context.clone())
    }
}
