//! Event bus for recovery telemetry.
//!
//! Provides an `EventBus` that distributes `RecoveryEvent` messages to all
//! subscribers via a `tokio::sync::broadcast` channel.

pub mod bus;

pub use bus::EventBus;
