//! Recovery strategy lookup for classified step failures.
//!
//! - `templates` -- the seven canonical strategy shapes and the static table
//! - `provider` -- `SimpleRecoveryProvider` (lookup, adaptation, telemetry)
//! - `backoff` -- concrete retry delays with jitter

pub mod backoff;
pub mod provider;
pub mod templates;

pub use provider::{RecoveryProvider, SimpleRecoveryProvider};
pub use templates::{StrategyTable, template_for};
