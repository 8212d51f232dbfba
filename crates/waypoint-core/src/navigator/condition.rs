//! JEXL evaluator for edge conditions.
//!
//! Wraps `jexl_eval::Evaluator` with the routine helper predicates
//! (`isEmpty`, `isNumber`, `isString`, `isBoolean`, `isArray`) and a few
//! string transforms pre-registered. Expressions run in a sandbox: they can
//! read the runtime context and call registered transforms, nothing else.
//!
//! The runtime context's top-level keys are the expression's identifiers:
//! with context `{"inputs": {"items": []}}` the condition
//! `inputs.items|isEmpty` evaluates to `true`.
//!
//! **Security note:** runtime values are always passed as context objects,
//! NEVER interpolated into expression strings.

use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during condition evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ConditionError {
    #[error("condition evaluation failed: {0}")]
    EvalFailed(String),

    #[error("invalid runtime context: {0}")]
    InvalidContext(String),
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// JavaScript-like truthiness.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// ---------------------------------------------------------------------------
// ConditionEvaluator
// ---------------------------------------------------------------------------

/// JEXL expression evaluator with the routine helpers registered.
pub struct ConditionEvaluator {
    evaluator: jexl_eval::Evaluator<'static>,
}

impl ConditionEvaluator {
    /// Create a new evaluator with all helper transforms registered.
    pub fn new() -> Self {
        let evaluator = jexl_eval::Evaluator::new()
            // Type predicates
            .with_transform("isEmpty", |args: &[Value]| {
                let val = args.first().unwrap_or(&Value::Null);
                Ok(json!(is_empty(val)))
            })
            .with_transform("isNumber", |args: &[Value]| {
                Ok(json!(args.first().is_some_and(Value::is_number)))
            })
            .with_transform("isString", |args: &[Value]| {
                Ok(json!(args.first().is_some_and(Value::is_string)))
            })
            .with_transform("isBoolean", |args: &[Value]| {
                Ok(json!(args.first().is_some_and(Value::is_boolean)))
            })
            .with_transform("isArray", |args: &[Value]| {
                Ok(json!(args.first().is_some_and(Value::is_array)))
            })
            // String transforms
            .with_transform("lower", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(s.to_lowercase()))
            })
            .with_transform("upper", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(s.to_uppercase()))
            })
            .with_transform("trim", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(s.trim()))
            })
            .with_transform("contains", |args: &[Value]| {
                let subject = args.first().and_then(|v| v.as_str()).unwrap_or("");
                let search = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(subject.contains(search)))
            })
            .with_transform("startsWith", |args: &[Value]| {
                let subject = args.first().and_then(|v| v.as_str()).unwrap_or("");
                let prefix = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(subject.starts_with(prefix)))
            })
            .with_transform("endsWith", |args: &[Value]| {
                let subject = args.first().and_then(|v| v.as_str()).unwrap_or("");
                let suffix = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(subject.ends_with(suffix)))
            })
            // Length of strings, arrays, and objects
            .with_transform("length", |args: &[Value]| {
                let len = match args.first() {
                    Some(Value::String(s)) => s.chars().count(),
                    Some(Value::Array(a)) => a.len(),
                    Some(Value::Object(o)) => o.len(),
                    _ => 0,
                };
                Ok(json!(len as f64))
            });

        Self { evaluator }
    }

    /// Evaluate a condition to a boolean using JavaScript-like truthiness.
    ///
    /// The `context` must be a JSON object.
    pub fn evaluate_bool(&self, expression: &str, context: &Value) -> Result<bool, ConditionError> {
        self.evaluate_value(expression, context)
            .map(|result| is_truthy(&result))
    }

    /// Evaluate an expression and return the raw JSON value.
    pub fn evaluate_value(&self, expression: &str, context: &Value) -> Result<Value, ConditionError> {
        if !context.is_object() {
            return Err(ConditionError::InvalidContext(
                "context must be a JSON object".to_string(),
            ));
        }

        self.evaluator
            .eval_in_context(expression, context)
            .map_err(|e| ConditionError::EvalFailed(e.to_string()))
    }
}

impl Default for ConditionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConditionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionEvaluator").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
