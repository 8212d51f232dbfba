//! Navigator for the native `RoutineGraph` format.
//!
//! Uses `petgraph` to index steps and edges once per loaded definition.
//! Node indices mirror the `steps` array order and edge weights carry the
//! position in the `edges` array, so every traversal result is reported in
//! authoring order.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::Value;
use waypoint_types::error::NavigationError;
use waypoint_types::routine::{Edge, Location, RoutineGraph, Step, StepInfo, StepType};

use super::Navigator;
use super::condition::ConditionEvaluator;

/// Only definitions with this major version are accepted.
pub const SUPPORTED_MAJOR_VERSION: u64 = 1;

// ---------------------------------------------------------------------------
// Indexed routine
// ---------------------------------------------------------------------------

/// A validated routine graph with adjacency indexed for traversal.
///
/// Immutable once built; shared via `Arc` between all traversal calls.
#[derive(Debug)]
struct IndexedRoutine {
    graph: RoutineGraph,
    /// Node weight = index into `graph.steps`, edge weight = index into `graph.edges`.
    dag: DiGraph<usize, usize>,
    node_ids: std::collections::HashMap<String, NodeIndex>,
}

impl IndexedRoutine {
    /// Validate structure and build the adjacency index.
    ///
    /// Checks:
    /// - All step IDs are unique
    /// - Every edge endpoint references an existing step
    /// - An explicit `metadata.startNodeId` references an existing step
    fn build(graph: RoutineGraph) -> Result<Self, NavigationError> {
        let mut dag = DiGraph::<usize, usize>::with_capacity(graph.steps.len(), graph.edges.len());
        let mut node_ids = std::collections::HashMap::with_capacity(graph.steps.len());

        for (i, step) in graph.steps.iter().enumerate() {
            let idx = dag.add_node(i);
            if node_ids.insert(step.id.clone(), idx).is_some() {
                return Err(NavigationError::DuplicateStep(step.id.clone()));
            }
        }

        for (i, edge) in graph.edges.iter().enumerate() {
            let lookup = |step_id: &str| {
                node_ids
                    .get(step_id)
                    .copied()
                    .ok_or_else(|| NavigationError::UnknownEdgeEndpoint {
                        edge_id: edge.id.clone(),
                        step_id: step_id.to_string(),
                    })
            };
            let from = lookup(&edge.from)?;
            let to = lookup(&edge.to)?;
            dag.add_edge(from, to, i);
        }

        if let Some(start) = graph
            .metadata
            .as_ref()
            .and_then(|m| m.start_node_id.as_deref())
        {
            if !node_ids.contains_key(start) {
                return Err(NavigationError::StartNodeNotFound(start.to_string()));
            }
        }

        Ok(Self {
            graph,
            dag,
            node_ids,
        })
    }

    fn node(&self, routine_id: &str, step_id: &str) -> Result<NodeIndex, NavigationError> {
        self.node_ids
            .get(step_id)
            .copied()
            .ok_or_else(|| NavigationError::StepNotFound {
                routine_id: routine_id.to_string(),
                step_id: step_id.to_string(),
            })
    }

    fn step(&self, node: NodeIndex) -> &Step {
        &self.graph.steps[self.dag[node]]
    }

    /// Edges leaving or entering `node`, in `edges` array order.
    fn edges_of(&self, node: NodeIndex, direction: Direction) -> Vec<&Edge> {
        let mut indices: Vec<usize> = self
            .dag
            .edges_directed(node, direction)
            .map(|e| *e.weight())
            .collect();
        indices.sort_unstable();
        indices.into_iter().map(|i| &self.graph.edges[i]).collect()
    }

    /// Steps with no incoming edge, in `steps` array order.
    fn zero_indegree_steps(&self) -> Vec<&Step> {
        self.dag
            .node_indices()
            .filter(|&n| {
                self.dag
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|n| self.step(n))
            .collect()
    }

    /// Follow single-successor chains from `first` until a node has zero or
    /// more than one outgoing edge, or a node repeats.
    fn trace_branch(&self, routine_id: &str, first: NodeIndex) -> Vec<Location> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = first;

        loop {
            if !visited.insert(current) {
                break;
            }
            path.push(Location::new(routine_id, &self.step(current).id));

            let mut successors = self.dag.edges_directed(current, Direction::Outgoing);
            match (successors.next(), successors.next()) {
                (Some(only), None) => current = only.target(),
                _ => break,
            }
        }

        path
    }
}

// ---------------------------------------------------------------------------
// Format check
// ---------------------------------------------------------------------------

/// Extract the major component of a definition version string.
///
/// Accepts full semver ("1.2.0") as well as short forms ("1", "1.2").
fn major_version(version: &str) -> Option<u64> {
    match semver::Version::parse(version) {
        Ok(v) => Some(v.major),
        Err(_) => version.split('.').next()?.trim().parse().ok(),
    }
}

// ---------------------------------------------------------------------------
// NativeNavigator
// ---------------------------------------------------------------------------

/// Navigator for native-format routine graphs.
///
/// Stateless apart from the per-routine definition cache, which is a
/// concurrent map so one navigator can serve many routine runs at once.
#[derive(Debug, Default)]
pub struct NativeNavigator {
    cache: DashMap<String, Arc<IndexedRoutine>>,
}

impl NativeNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached routine definitions.
    pub fn cached_routines(&self) -> usize {
        self.cache.len()
    }

    fn parse(&self, definition: &Value) -> Result<IndexedRoutine, NavigationError> {
        if !self.can_navigate(definition) {
            return Err(NavigationError::UnsupportedFormat(
                "expected version 1.x with non-empty 'steps' and an 'edges' array".to_string(),
            ));
        }
        let graph: RoutineGraph = serde_json::from_value(definition.clone())
            .map_err(|e| NavigationError::Parse(e.to_string()))?;
        IndexedRoutine::build(graph)
    }

    fn cached(&self, routine_id: &str) -> Result<Arc<IndexedRoutine>, NavigationError> {
        self.cache
            .get(routine_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| NavigationError::RoutineNotLoaded(routine_id.to_string()))
    }

    fn cached_or_load(
        &self,
        routine_id: &str,
        definition: &Value,
    ) -> Result<Arc<IndexedRoutine>, NavigationError> {
        if let Ok(routine) = self.cached(routine_id) {
            tracing::debug!(
                routine_id,
                "Routine already cached, ignoring supplied definition"
            );
            return Ok(routine);
        }
        self.validate_and_cache(routine_id, definition)?;
        self.cached(routine_id)
    }
}

impl Navigator for NativeNavigator {
    fn format(&self) -> &'static str {
        "native"
    }

    fn can_navigate(&self, definition: &Value) -> bool {
        let version_ok = definition
            .get("version")
            .and_then(Value::as_str)
            .and_then(major_version)
            .is_some_and(|major| major == SUPPORTED_MAJOR_VERSION);
        let steps_ok = definition
            .get("steps")
            .and_then(Value::as_array)
            .is_some_and(|steps| !steps.is_empty());
        let edges_ok = definition.get("edges").is_some_and(Value::is_array);

        version_ok && steps_ok && edges_ok
    }

    fn validate_and_cache(
        &self,
        routine_id: &str,
        definition: &Value,
    ) -> Result<(), NavigationError> {
        let routine = self.parse(definition)?;

        if is_cyclic_directed(&routine.dag) {
            tracing::debug!(routine_id, "Routine graph contains cycles");
        }
        tracing::debug!(
            routine_id,
            steps = routine.graph.steps.len(),
            edges = routine.graph.edges.len(),
            "Cached routine definition"
        );

        self.cache.insert(routine_id.to_string(), Arc::new(routine));
        Ok(())
    }

    fn start_location(
        &self,
        routine_id: &str,
        definition: &Value,
    ) -> Result<Location, NavigationError> {
        let routine = self.cached_or_load(routine_id, definition)?;

        if let Some(start) = routine
            .graph
            .metadata
            .as_ref()
            .and_then(|m| m.start_node_id.as_deref())
        {
            if !routine.node_ids.contains_key(start) {
                return Err(NavigationError::StartNodeNotFound(start.to_string()));
            }
            return Ok(Location::new(routine_id, start));
        }

        let candidates = routine.zero_indegree_steps();
        let first = candidates.first().ok_or(NavigationError::NoStartNode)?;
        if candidates.len() > 1 {
            let ids: Vec<&str> = candidates.iter().map(|s| s.id.as_str()).collect();
            tracing::warn!(
                routine_id,
                candidates = ?ids,
                chosen = %first.id,
                "Multiple start nodes found, using the first in step order"
            );
        }

        Ok(Location::new(routine_id, &first.id))
    }

    fn next_locations(
        &self,
        current: &Location,
        runtime_context: &Value,
    ) -> Result<Vec<Location>, NavigationError> {
        let routine = self.cached(&current.routine_id)?;
        let node = routine.node(&current.routine_id, &current.node_id)?;
        let evaluator = ConditionEvaluator::new();

        let mut next = Vec::new();
        for edge in routine.edges_of(node, Direction::Outgoing) {
            let traversable = match edge.condition.as_deref() {
                None => true,
                Some(condition) => match evaluator.evaluate_bool(condition, runtime_context) {
                    Ok(result) => result,
                    Err(err) => {
                        tracing::warn!(
                            routine_id = %current.routine_id,
                            edge_id = %edge.id,
                            condition,
                            error = %err,
                            "Edge condition failed to evaluate, treating edge as not traversable"
                        );
                        false
                    }
                },
            };
            if traversable {
                next.push(Location::new(&current.routine_id, &edge.to));
            }
        }

        Ok(next)
    }

    fn is_end_location(&self, location: &Location) -> Result<bool, NavigationError> {
        let routine = self.cached(&location.routine_id)?;
        let node = routine.node(&location.routine_id, &location.node_id)?;

        let explicit_end = routine
            .graph
            .metadata
            .as_ref()
            .is_some_and(|m| m.end_node_ids.iter().any(|id| *id == location.node_id));
        if explicit_end {
            return Ok(true);
        }

        Ok(routine
            .dag
            .neighbors_directed(node, Direction::Outgoing)
            .next()
            .is_none())
    }

    fn step_info(&self, location: &Location) -> Result<StepInfo, NavigationError> {
        let routine = self.cached(&location.routine_id)?;
        let node = routine.node(&location.routine_id, &location.node_id)?;
        Ok(StepInfo::from(routine.step(node)))
    }

    fn dependencies(&self, location: &Location) -> Result<Vec<String>, NavigationError> {
        let routine = self.cached(&location.routine_id)?;
        let node = routine.node(&location.routine_id, &location.node_id)?;

        let mut seen = HashSet::new();
        Ok(routine
            .edges_of(node, Direction::Incoming)
            .into_iter()
            .filter(|edge| seen.insert(edge.from.as_str()))
            .map(|edge| edge.from.clone())
            .collect())
    }

    fn parallel_branches(
        &self,
        location: &Location,
    ) -> Result<Vec<Vec<Location>>, NavigationError> {
        let routine = self.cached(&location.routine_id)?;
        let node = routine.node(&location.routine_id, &location.node_id)?;

        if routine.step(node).step_type != StepType::Parallel {
            return Ok(Vec::new());
        }

        Ok(routine
            .edges_of(node, Direction::Outgoing)
            .into_iter()
            .filter_map(|edge| routine.node_ids.get(edge.to.as_str()).copied())
            .map(|first| routine.trace_branch(&location.routine_id, first))
            .collect())
    }

    fn evict(&self, routine_id: &str) -> bool {
        self.cache.remove(routine_id).is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Helper: build a native definition from step IDs and (from, to, condition) edges.
    fn graph(steps: &[(&str, &str)], edges: &[(&str, &str, Option<&str>)]) -> Value {
        let steps: Vec<Value> = steps
            .iter()
            .map(|(id, ty)| json!({ "id": id, "name": id.to_uppercase(), "type": ty }))
            .collect();
        let edges: Vec<Value> = edges
            .iter()
            .enumerate()
            .map(|(i, (from, to, condition))| {
                let mut edge = json!({ "id": format!("e{i}"), "from": from, "to": to });
                if let Some(c) = condition {
                    edge["condition"] = json!(c);
                }
                edge
            })
            .collect();
        json!({ "version": "1.0.0", "steps": steps, "edges": edges })
    }

    fn linear() -> Value {
        graph(
            &[("a", "action"), ("b", "action"), ("c", "action")],
            &[("a", "b", None), ("b", "c", None)],
        )
    }

    fn node_ids(locations: &[Location]) -> Vec<&str> {
        locations.iter().map(|l| l.node_id.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // can_navigate
    // -----------------------------------------------------------------------

    #[test]
    fn test_can_navigate_accepts_v1() {
        let nav = NativeNavigator::new();
        assert!(nav.can_navigate(&linear()));

        let mut short = linear();
        short["version"] = json!("1");
        assert!(nav.can_navigate(&short));
    }

    #[test]
    fn test_can_navigate_rejects_other_shapes() {
        let nav = NativeNavigator::new();

        let mut v2 = linear();
        v2["version"] = json!("2.0.0");
        assert!(!nav.can_navigate(&v2));

        let mut no_version = linear();
        no_version.as_object_mut().unwrap().remove("version");
        assert!(!nav.can_navigate(&no_version));

        let mut no_edges = linear();
        no_edges.as_object_mut().unwrap().remove("edges");
        assert!(!nav.can_navigate(&no_edges));

        assert!(!nav.can_navigate(&json!({ "version": "1.0.0", "steps": [], "edges": [] })));
        assert!(!nav.can_navigate(&json!({ "version": "1.0.0", "steps": {}, "edges": [] })));
    }

    #[test]
    fn test_can_navigate_ignores_edge_integrity() {
        let nav = NativeNavigator::new();
        let def = graph(&[("a", "action")], &[("a", "ghost", None)]);
        assert!(nav.can_navigate(&def));
        assert!(nav.validate_and_cache("r", &def).is_err());
    }

    // -----------------------------------------------------------------------
    // Structural validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_duplicate_step_rejected() {
        let nav = NativeNavigator::new();
        let def = graph(&[("a", "action"), ("a", "decision")], &[]);
        let err = nav.validate_and_cache("r", &def).unwrap_err();
        assert!(matches!(err, NavigationError::DuplicateStep(id) if id == "a"));
        assert_eq!(nav.cached_routines(), 0);
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let nav = NativeNavigator::new();
        let def = graph(&[("a", "action"), ("b", "action")], &[("a", "zzz", None)]);
        let err = nav.validate_and_cache("r", &def).unwrap_err();
        assert!(matches!(
            err,
            NavigationError::UnknownEdgeEndpoint { ref step_id, .. } if step_id == "zzz"
        ));
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let nav = NativeNavigator::new();
        let err = nav
            .validate_and_cache("r", &json!({ "nodes": [] }))
            .unwrap_err();
        assert!(matches!(err, NavigationError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unknown_step_type_is_parse_error() {
        let nav = NativeNavigator::new();
        let def = graph(&[("a", "teleport")], &[]);
        let err = nav.validate_and_cache("r", &def).unwrap_err();
        assert!(matches!(err, NavigationError::Parse(_)));
    }

    // -----------------------------------------------------------------------
    // Start location
    // -----------------------------------------------------------------------

    #[test]
    fn test_start_linear_chain() {
        let nav = NativeNavigator::new();
        let start = nav.start_location("r1", &linear()).unwrap();
        assert_eq!(start, Location::new("r1", "a"));
    }

    #[test]
    fn test_start_independent_of_step_order() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("c", "action"), ("b", "action"), ("a", "action")],
            &[("a", "b", None), ("b", "c", None)],
        );
        assert_eq!(nav.start_location("r", &def).unwrap().node_id, "a");
    }

    #[test]
    fn test_start_explicit_metadata() {
        let nav = NativeNavigator::new();
        let mut def = linear();
        def["metadata"] = json!({ "startNodeId": "b" });
        assert_eq!(nav.start_location("r", &def).unwrap().node_id, "b");
    }

    #[test]
    fn test_start_explicit_missing_node() {
        let nav = NativeNavigator::new();
        let mut def = linear();
        def["metadata"] = json!({ "startNodeId": "nope" });
        let err = nav.start_location("r", &def).unwrap_err();
        assert!(matches!(err, NavigationError::StartNodeNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_start_circular_graph() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("a", "action"), ("b", "action")],
            &[("a", "b", None), ("b", "a", None)],
        );
        let err = nav.start_location("r", &def).unwrap_err();
        assert!(matches!(err, NavigationError::NoStartNode));
        assert!(err.to_string().contains("no start node found (circular graph)"));
    }

    #[test]
    fn test_start_multiple_candidates_picks_first_in_array() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("x", "action"), ("y", "action"), ("z", "action")],
            &[("x", "z", None), ("y", "z", None)],
        );
        assert_eq!(nav.start_location("r", &def).unwrap().node_id, "x");
    }

    #[test]
    fn test_routine_id_is_explicit_cache_key() {
        let nav = NativeNavigator::new();
        let first = graph(&[("shared", "action"), ("one", "action")], &[("shared", "one", None)]);
        let second = graph(&[("shared", "action"), ("two", "action")], &[("shared", "two", None)]);

        nav.start_location("routine-1", &first).unwrap();
        nav.start_location("routine-2", &second).unwrap();
        assert_eq!(nav.cached_routines(), 2);

        let ctx = json!({});
        let n1 = nav.next_locations(&Location::new("routine-1", "shared"), &ctx).unwrap();
        let n2 = nav.next_locations(&Location::new("routine-2", "shared"), &ctx).unwrap();
        assert_eq!(node_ids(&n1), vec!["one"]);
        assert_eq!(node_ids(&n2), vec!["two"]);
    }

    #[test]
    fn test_cached_definition_wins_until_replaced() {
        let nav = NativeNavigator::new();
        let original = graph(&[("a", "action"), ("b", "action")], &[("a", "b", None)]);
        let revised = graph(&[("c", "action"), ("d", "action")], &[("c", "d", None)]);

        assert_eq!(nav.start_location("r", &original).unwrap().node_id, "a");
        assert_eq!(nav.start_location("r", &revised).unwrap().node_id, "a");

        nav.validate_and_cache("r", &revised).unwrap();
        assert_eq!(nav.start_location("r", &revised).unwrap().node_id, "c");
    }

    // -----------------------------------------------------------------------
    // Next locations
    // -----------------------------------------------------------------------

    #[test]
    fn test_next_linear() {
        let nav = NativeNavigator::new();
        let start = nav.start_location("r", &linear()).unwrap();
        let next = nav.next_locations(&start, &json!({})).unwrap();
        assert_eq!(next, vec![Location::new("r", "b")]);
    }

    #[test]
    fn test_next_conditional_edges() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("d", "decision"), ("yes", "action"), ("no", "action"), ("log", "action")],
            &[
                ("d", "yes", Some("approved == true")),
                ("d", "no", Some("approved == false")),
                ("d", "log", None),
            ],
        );
        nav.validate_and_cache("r", &def).unwrap();
        let here = Location::new("r", "d");

        let next = nav.next_locations(&here, &json!({ "approved": true })).unwrap();
        assert_eq!(node_ids(&next), vec!["yes", "log"]);

        let next = nav.next_locations(&here, &json!({ "approved": false })).unwrap();
        assert_eq!(node_ids(&next), vec!["no", "log"]);
    }

    #[test]
    fn test_next_helper_predicates() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("d", "decision"), ("empty", "action"), ("work", "action")],
            &[
                ("d", "empty", Some("items|isEmpty")),
                ("d", "work", Some("items|isArray && items|length > 0")),
            ],
        );
        nav.validate_and_cache("r", &def).unwrap();
        let here = Location::new("r", "d");

        let next = nav.next_locations(&here, &json!({ "items": [] })).unwrap();
        assert_eq!(node_ids(&next), vec!["empty"]);

        let next = nav.next_locations(&here, &json!({ "items": [1, 2] })).unwrap();
        assert_eq!(node_ids(&next), vec!["work"]);
    }

    #[test]
    fn test_next_failing_condition_is_fail_closed() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("a", "decision"), ("broken", "action"), ("ok", "action")],
            &[("a", "broken", Some("count >")), ("a", "ok", None)],
        );
        nav.validate_and_cache("r", &def).unwrap();

        let next = nav
            .next_locations(&Location::new("r", "a"), &json!({ "count": 1.0 }))
            .unwrap();
        assert_eq!(node_ids(&next), vec!["ok"]);
    }

    #[test]
    fn test_next_non_object_context_excludes_conditional_edges() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("a", "decision"), ("c", "action"), ("u", "action")],
            &[("a", "c", Some("true")), ("a", "u", None)],
        );
        nav.validate_and_cache("r", &def).unwrap();
        let next = nav
            .next_locations(&Location::new("r", "a"), &json!([1, 2]))
            .unwrap();
        assert_eq!(node_ids(&next), vec!["u"]);
    }

    #[test]
    fn test_next_end_of_path_is_empty() {
        let nav = NativeNavigator::new();
        nav.validate_and_cache("r", &linear()).unwrap();
        let next = nav.next_locations(&Location::new("r", "c"), &json!({})).unwrap();
        assert!(next.is_empty());
    }

    #[test]
    fn test_next_unknown_routine_and_step() {
        let nav = NativeNavigator::new();
        let err = nav
            .next_locations(&Location::new("missing", "a"), &json!({}))
            .unwrap_err();
        assert!(matches!(err, NavigationError::RoutineNotLoaded(_)));

        nav.validate_and_cache("r", &linear()).unwrap();
        let err = nav
            .next_locations(&Location::new("r", "nope"), &json!({}))
            .unwrap_err();
        assert!(matches!(err, NavigationError::StepNotFound { .. }));
    }

    // -----------------------------------------------------------------------
    // End detection, step info, dependencies
    // -----------------------------------------------------------------------

    #[test]
    fn test_is_end_location_without_metadata() {
        let nav = NativeNavigator::new();
        nav.validate_and_cache("r", &linear()).unwrap();
        assert!(nav.is_end_location(&Location::new("r", "c")).unwrap());
        assert!(!nav.is_end_location(&Location::new("r", "a")).unwrap());
    }

    #[test]
    fn test_is_end_location_explicit() {
        let nav = NativeNavigator::new();
        let mut def = linear();
        def["metadata"] = json!({ "endNodeIds": ["b"] });
        nav.validate_and_cache("r", &def).unwrap();
        assert!(nav.is_end_location(&Location::new("r", "b")).unwrap());
        assert!(nav.is_end_location(&Location::new("r", "c")).unwrap());
        assert!(!nav.is_end_location(&Location::new("r", "a")).unwrap());
    }

    #[test]
    fn test_step_info_projection() {
        let nav = NativeNavigator::new();
        let def = json!({
            "version": "1.0.0",
            "steps": [{
                "id": "fetch",
                "name": "Fetch Records",
                "type": "action",
                "description": "pull rows",
                "config": { "table": "orders" }
            }],
            "edges": []
        });
        nav.validate_and_cache("r", &def).unwrap();
        let info = nav.step_info(&Location::new("r", "fetch")).unwrap();
        assert_eq!(info.name, "Fetch Records");
        assert_eq!(info.step_type, StepType::Action);
        assert_eq!(info.config, Some(json!({ "table": "orders" })));

        let err = nav.step_info(&Location::new("r", "other")).unwrap_err();
        assert!(matches!(err, NavigationError::StepNotFound { .. }));
    }

    #[test]
    fn test_dependencies_are_immediate_predecessors() {
        //   a   b
        //    \ /
        //     c -> d
        let nav = NativeNavigator::new();
        let def = graph(
            &[("a", "action"), ("b", "action"), ("c", "action"), ("d", "action")],
            &[("a", "c", None), ("b", "c", None), ("c", "d", None), ("a", "c", Some("retry"))],
        );
        nav.validate_and_cache("r", &def).unwrap();
        assert_eq!(
            nav.dependencies(&Location::new("r", "c")).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(nav.dependencies(&Location::new("r", "d")).unwrap(), vec!["c".to_string()]);
        assert!(nav.dependencies(&Location::new("r", "a")).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Parallel branches
    // -----------------------------------------------------------------------

    #[test]
    fn test_parallel_branches_trace_chains() {
        //        p
        //      /   \
        //     x1    y1
        //     |     |
        //     x2    y2
        //      \   /
        //        j
        let nav = NativeNavigator::new();
        let def = graph(
            &[
                ("p", "parallel"),
                ("x1", "action"),
                ("x2", "action"),
                ("y1", "action"),
                ("y2", "action"),
                ("j", "action"),
            ],
            &[
                ("p", "x1", None),
                ("p", "y1", None),
                ("x1", "x2", None),
                ("y1", "y2", None),
                ("x2", "j", None),
                ("y2", "j", None),
            ],
        );
        nav.validate_and_cache("r", &def).unwrap();
        let branches = nav.parallel_branches(&Location::new("r", "p")).unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(node_ids(&branches[0]), vec!["x1", "x2", "j"]);
        assert_eq!(node_ids(&branches[1]), vec!["y1", "y2", "j"]);
    }

    #[test]
    fn test_parallel_branch_stops_at_divergence() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("p", "parallel"), ("a", "action"), ("b", "decision"), ("c", "action"), ("d", "action")],
            &[("p", "a", None), ("a", "b", None), ("b", "c", None), ("b", "d", None)],
        );
        nav.validate_and_cache("r", &def).unwrap();
        let branches = nav.parallel_branches(&Location::new("r", "p")).unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(node_ids(&branches[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_parallel_branch_cycle_guard() {
        let nav = NativeNavigator::new();
        let def = graph(
            &[("p", "parallel"), ("a", "action"), ("b", "action")],
            &[("p", "a", None), ("a", "b", None), ("b", "a", None)],
        );
        nav.validate_and_cache("r", &def).unwrap();
        let branches = nav.parallel_branches(&Location::new("r", "p")).unwrap();
        assert_eq!(node_ids(&branches[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_parallel_branches_non_parallel_step_is_empty() {
        let nav = NativeNavigator::new();
        nav.validate_and_cache("r", &linear()).unwrap();
        assert!(nav.parallel_branches(&Location::new("r", "a")).unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Cache lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn test_evict_drops_cache_entry() {
        let nav = NativeNavigator::new();
        nav.validate_and_cache("r", &linear()).unwrap();
        assert!(nav.evict("r"));
        assert!(!nav.evict("r"));
        assert!(matches!(
            nav.is_end_location(&Location::new("r", "c")),
            Err(NavigationError::RoutineNotLoaded(_))
        ));
    }

    #[test]
    fn test_navigator_shared_across_threads() {
        let nav = Arc::new(NativeNavigator::new());
        nav.validate_and_cache("r", &linear()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let nav = Arc::clone(&nav);
                std::thread::spawn(move || {
                    nav.next_locations(&Location::new("r", "a"), &json!({}))
                        .unwrap()
                        .len()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
    }
}
