//! Graph navigation over compiled routine definitions.
//!
//! - `native` -- navigator for the native `RoutineGraph` JSON format
//! - `condition` -- JEXL evaluator for edge conditions
//! - `registry` -- format dispatch across multiple navigators
//!
//! Navigators separate structural validity (checked once when a definition
//! is loaded, fails hard) from condition evaluation (checked per traversal
//! call, fails closed by dropping the edge).

pub mod condition;
pub mod native;
pub mod registry;

use serde_json::Value;
use waypoint_types::error::NavigationError;
use waypoint_types::routine::{Location, StepInfo};

pub use native::NativeNavigator;
pub use registry::NavigatorRegistry;

/// A traversal engine for one routine graph format.
///
/// Definitions are cached per externally supplied `routine_id`; every
/// location-based call resolves against that cache. Implementations must
/// be safe to share across concurrent routine runs.
pub trait Navigator: Send + Sync {
    /// Short format identifier (e.g. "native").
    fn format(&self) -> &'static str;

    /// Cheap shape check: can this navigator read `definition` at all?
    ///
    /// Does not validate edge integrity; that happens in
    /// [`validate_and_cache`](Navigator::validate_and_cache).
    fn can_navigate(&self, definition: &Value) -> bool;

    /// Parse and structurally validate `definition`, replacing any cached
    /// entry for `routine_id`.
    fn validate_and_cache(&self, routine_id: &str, definition: &Value)
    -> Result<(), NavigationError>;

    /// Resolve the start location, loading the definition if it is not
    /// cached yet.
    ///
    /// Once `routine_id` is cached, `definition` is ignored; call
    /// `validate_and_cache` (or `evict`) to replace a cached definition.
    fn start_location(&self, routine_id: &str, definition: &Value)
    -> Result<Location, NavigationError>;

    /// Locations reachable from `current` whose edge conditions hold for
    /// `runtime_context`. Empty at the end of a path.
    fn next_locations(
        &self,
        current: &Location,
        runtime_context: &Value,
    ) -> Result<Vec<Location>, NavigationError>;

    fn is_end_location(&self, location: &Location) -> Result<bool, NavigationError>;

    fn step_info(&self, location: &Location) -> Result<StepInfo, NavigationError>;

    /// Immediate predecessors of the location's node.
    fn dependencies(&self, location: &Location) -> Result<Vec<String>, NavigationError>;

    /// One traced path per outgoing edge of a parallel step.
    fn parallel_branches(&self, location: &Location)
    -> Result<Vec<Vec<Location>>, NavigationError>;

    /// Drop the cached definition for `routine_id`. Returns whether an
    /// entry existed.
    fn evict(&self, routine_id: &str) -> bool;
}
