//! Shared domain types for Waypoint.
//!
//! This crate contains the types exchanged between the routine execution
//! core and its callers: routine graphs and locations, error
//! classifications and recovery strategies, strategy execution results,
//! recovery events, and engine configuration.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod recovery;
pub mod routine;
pub mod strategy;
