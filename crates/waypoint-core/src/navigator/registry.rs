//! Navigator registry for runtime format dispatch.
//!
//! Holds navigators in registration order; the first one whose
//! `can_navigate` accepts a definition handles it.

use std::sync::Arc;

use serde_json::Value;
use waypoint_types::error::NavigationError;

use super::Navigator;
use super::native::NativeNavigator;

/// Ordered set of available navigators.
#[derive(Clone, Default)]
pub struct NavigatorRegistry {
    navigators: Vec<Arc<dyn Navigator>>,
}

impl NavigatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the native navigator.
    pub fn with_native() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(NativeNavigator::new()));
        registry
    }

    /// Register a navigator. Earlier registrations win when several accept
    /// the same definition.
    pub fn register(&mut self, navigator: Arc<dyn Navigator>) {
        self.navigators.push(navigator);
    }

    /// Find the navigator able to read `definition`.
    pub fn resolve(&self, definition: &Value) -> Result<Arc<dyn Navigator>, NavigationError> {
        self.navigators
            .iter()
            .find(|nav| nav.can_navigate(definition))
            .cloned()
            .ok_or_else(|| {
                NavigationError::UnsupportedFormat(format!(
                    "no registered navigator accepts this definition (known formats: {})",
                    self.formats().join(", ")
                ))
            })
    }

    /// Format identifiers of all registered navigators.
    pub fn formats(&self) -> Vec<&'static str> {
        self.navigators.iter().map(|nav| nav.format()).collect()
    }
}

impl std::fmt::Debug for NavigatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigatorRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}
