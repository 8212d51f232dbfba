//! Routine-execution strategy engine for Waypoint.
//!
//! Four cooperating components sit between the workflow compiler and the
//! concrete step executors:
//!
//! - `navigator` -- traverses compiled routine graphs
//! - `recovery` -- maps classified failures to recovery strategies
//! - `strategy` -- runs steps through registered strategies with fallback
//! - `event` -- broadcast bus carrying recovery telemetry
//!
//! This crate depends only on `waypoint-types` -- never on
//! `waypoint-infra` or any filesystem/IO crate.

pub mod event;
pub mod navigator;
pub mod recovery;
pub mod strategy;
