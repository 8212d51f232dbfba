use thiserror::Error;

/// Errors raised by graph navigators.
///
/// Structural problems (duplicate IDs, dangling edges, no start node) are
/// raised when a definition is validated and are never recovered silently.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("definition is not a supported routine graph: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse routine graph: {0}")]
    Parse(String),

    #[error("duplicate step ID: '{0}'")]
    DuplicateStep(String),

    #[error("edge '{edge_id}' references unknown step '{step_id}'")]
    UnknownEdgeEndpoint { edge_id: String, step_id: String },

    #[error("start node not found: '{0}'")]
    StartNodeNotFound(String),

    #[error("no start node found (circular graph)")]
    NoStartNode,

    #[error("routine '{0}' has not been loaded")]
    RoutineNotLoaded(String),

    #[error("step '{step_id}' not found in routine '{routine_id}'")]
    StepNotFound { routine_id: String, step_id: String },
}
