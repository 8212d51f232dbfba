//! Infrastructure layer for Waypoint.
//!
//! Filesystem adapters for the engine: `config.toml` loading with config
//! directory resolution, and routine definition files (JSON or YAML).

pub mod config;
pub mod routine_file;
