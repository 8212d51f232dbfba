//! Routine graph domain types.
//!
//! A routine is a directed graph of steps produced by the workflow compiler.
//! The native wire format is camelCase JSON:
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "steps": [{ "id": "a", "name": "Fetch", "type": "action" }],
//!   "edges": [{ "id": "e1", "from": "a", "to": "b", "condition": "ready" }],
//!   "metadata": { "startNodeId": "a", "endNodeIds": ["b"] }
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Graph definition (native format)
// ---------------------------------------------------------------------------

/// A compiled routine graph in the native navigator format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutineGraph {
    /// Format version (semver string, major must be 1).
    pub version: String,
    /// Steps in authoring order. Order matters for start-node tie-breaking.
    pub steps: Vec<Step>,
    /// Directed edges between steps.
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GraphMetadata>,
}

/// Optional navigation hints attached to a routine graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    /// Explicit start node. Overrides zero-indegree detection when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_id: Option<String>,
    /// Nodes that end the routine even if they have outgoing edges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub end_node_ids: Vec<String>,
}

/// A single step (node) in a routine graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step ID, unique within the graph.
    pub id: String,
    /// Human-readable step name.
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
}

/// The kind of step in a routine graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Action,
    Decision,
    Loop,
    Parallel,
    Subroutine,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Action => "action",
            StepType::Decision => "decision",
            StepType::Loop => "loop",
            StepType::Parallel => "parallel",
            StepType::Subroutine => "subroutine",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge between two steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    /// Source step ID.
    pub from: String,
    /// Target step ID.
    pub to: String,
    /// Optional JEXL condition evaluated against the runtime context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A position within one routine's graph.
///
/// Immutable once created. Many locations may exist concurrently for
/// different execution threads over the same routine definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Opaque composite key (`{routine_id}:{node_id}`).
    pub id: String,
    pub routine_id: String,
    pub node_id: String,
}

impl Location {
    pub fn new(routine_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        let routine_id = routine_id.into();
        let node_id = node_id.into();
        Self {
            id: format!("{routine_id}:{node_id}"),
            routine_id,
            node_id,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ---------------------------------------------------------------------------
// StepInfo
// ---------------------------------------------------------------------------

/// Read-only projection of a step, returned by navigators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
}

impl From<&Step> for StepInfo {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id.clone(),
            name: step.name.clone(),
            step_type: step.step_type,
            description: step.description.clone(),
            config: step.config.clone(),
            inputs: step.inputs.clone(),
            outputs: step.outputs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graph_deserialize_native_format() {
        let raw = json!({
            "version": "1.0.0",
            "steps": [
                { "id": "a", "name": "Fetch", "type": "action" },
                { "id": "b", "name": "Branch", "type": "decision", "config": { "k": 1 } }
            ],
            "edges": [
                { "id": "e1", "from": "a", "to": "b", "condition": "ready == true" }
            ],
            "metadata": { "startNodeId": "a", "endNodeIds": ["b"] }
        });
        let graph: RoutineGraph = serde_json::from_value(raw).unwrap();
        assert_eq!(graph.steps.len(), 2);
        assert_eq!(graph.steps[1].step_type, StepType::Decision);
        assert_eq!(graph.edges[0].condition.as_deref(), Some("ready == true"));
        let meta = graph.metadata.unwrap();
        assert_eq!(meta.start_node_id.as_deref(), Some("a"));
        assert_eq!(meta.end_node_ids, vec!["b".to_string()]);
    }

    #[test]
    fn test_graph_metadata_optional() {
        let raw = json!({
            "version": "1.0.0",
            "steps": [{ "id": "a", "name": "A", "type": "parallel" }],
            "edges": []
        });
        let graph: RoutineGraph = serde_json::from_value(raw).unwrap();
        assert!(graph.metadata.is_none());
    }

    #[test]
    fn test_unknown_step_type_rejected() {
        let raw = json!({ "id": "a", "name": "A", "type": "teleport" });
        assert!(serde_json::from_value::<Step>(raw).is_err());
    }

    #[test]
    fn test_location_composite_id() {
        let loc = Location::new("routine-7", "fetch");
        assert_eq!(loc.id, "routine-7:fetch");
        assert_eq!(loc.routine_id, "routine-7");
        assert_eq!(loc.node_id, "fetch");
        assert_eq!(loc.to_string(), "routine-7:fetch");
    }

    #[test]
    fn test_step_info_projection() {
        let step = Step {
            id: "s1".to_string(),
            name: "Summarize".to_string(),
            step_type: StepType::Action,
            description: Some("summarize inbox".to_string()),
            config: Some(json!({ "model": "small" })),
            inputs: None,
            outputs: Some(json!(["summary"])),
        };
        let info = StepInfo::from(&step);
        assert_eq!(info.id, "s1");
        assert_eq!(info.step_type, StepType::Action);
        assert_eq!(info.config, Some(json!({ "model": "small" })));
        assert_eq!(info.outputs, Some(json!(["summary"])));
    }
}
