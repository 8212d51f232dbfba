//! Routine definition file loading.
//!
//! Definitions are read as untyped JSON so that any registered navigator
//! format can be tried against them. YAML files are converted to the same
//! JSON value model.

use std::path::Path;

use serde_json::Value;

/// Errors that can occur while loading a routine definition file.
#[derive(Debug, thiserror::Error)]
pub enum RoutineFileError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported routine file extension '{0}' (expected json, yaml or yml)")]
    UnsupportedExtension(String),

    #[error("invalid JSON in '{path}': {reason}")]
    Json { path: String, reason: String },

    #[error("invalid YAML in '{path}': {reason}")]
    Yaml { path: String, reason: String },
}

/// Load a routine definition from a `.json`, `.yaml` or `.yml` file.
pub async fn load_routine_file(path: &Path) -> Result<Value, RoutineFileError> {
    let path_str = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !matches!(extension.as_str(), "json" | "yaml" | "yml") {
        return Err(RoutineFileError::UnsupportedExtension(extension));
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RoutineFileError::Read {
            path: path_str.clone(),
            source,
        })?;

    let definition = if extension == "json" {
        serde_json::from_str(&content).map_err(|e| RoutineFileError::Json {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
    } else {
        serde_yaml_ng::from_str(&content).map_err(|e| RoutineFileError::Yaml {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
    };

    tracing::debug!(path = %path_str, "Loaded routine definition");
    Ok(definition)
}
