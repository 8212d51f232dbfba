//! Strategy execution: pluggable handlers, the factory that holds them, and
//! the selector that runs them with ordered fallback.
//!
//! - `context` -- `ExecutionContext` handed to every attempt
//! - `handler` -- `StrategyHandler` trait, `BoxStrategyHandler`, `FnStrategy`
//! - `factory` -- `StrategyFactory` (registration, matching, statistics)
//! - `selector` -- `StrategySelector` (primary + fallback state machine)

pub mod context;
pub mod factory;
pub mod handler;
pub mod selector;

pub use context::ExecutionContext;
pub use factory::StrategyFactory;
pub use handler::{BoxStrategyHandler, FnStrategy, StrategyError, StrategyHandler};
pub use selector::StrategySelector;
