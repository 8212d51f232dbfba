//! Error classification and recovery strategy types.
//!
//! `ErrorClassification` is produced upstream and consumed read-only.
//! `RecoveryStrategyConfig` is a value object created fresh per lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// How severe a classified error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warning,
    Error,
    Critical,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WARNING" => Ok(Severity::Warning),
            "ERROR" => Ok(Severity::Error),
            "CRITICAL" => Ok(Severity::Critical),
            "FATAL" => Ok(Severity::Fatal),
            _ => Err(format!("unknown severity '{s}'")),
        }
    }
}

/// What kind of failure a classified error represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Security,
    Transient,
    Resource,
    Logic,
    Validation,
    Configuration,
    External,
    /// Any category this crate does not know about.
    #[serde(other)]
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 8] = [
        ErrorCategory::Security,
        ErrorCategory::Transient,
        ErrorCategory::Resource,
        ErrorCategory::Logic,
        ErrorCategory::Validation,
        ErrorCategory::Configuration,
        ErrorCategory::External,
        ErrorCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Security => "SECURITY",
            ErrorCategory::Transient => "TRANSIENT",
            ErrorCategory::Resource => "RESOURCE",
            ErrorCategory::Logic => "LOGIC",
            ErrorCategory::Validation => "VALIDATION",
            ErrorCategory::Configuration => "CONFIGURATION",
            ErrorCategory::External => "EXTERNAL",
            ErrorCategory::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized names parse as [`ErrorCategory::Unknown`].
impl std::str::FromStr for ErrorCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ErrorCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .unwrap_or(ErrorCategory::Unknown))
    }
}

/// Whether (and how) an error can be recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recoverability {
    Full,
    Partial,
    #[default]
    Unknown,
    None,
}

/// Upstream classification of a step failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorClassification {
    pub severity: Severity,
    pub category: ErrorCategory,
    #[serde(default)]
    pub recoverability: Recoverability,
    #[serde(default)]
    pub security_risk: bool,
}

impl ErrorClassification {
    pub fn new(severity: Severity, category: ErrorCategory) -> Self {
        Self {
            severity,
            category,
            recoverability: Recoverability::default(),
            security_risk: false,
        }
    }

    /// Lookup key into the recovery table: `"{severity}:{category}"`.
    pub fn lookup_key(&self) -> String {
        format!("{}:{}", self.severity, self.category)
    }
}

// ---------------------------------------------------------------------------
// Recovery strategy config
// ---------------------------------------------------------------------------

/// The canonical recovery strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryStrategyType {
    EmergencyStop,
    EscalateToHuman,
    RetrySame,
    WaitAndRetry,
    ReduceScope,
    FallbackStrategy,
    RetryModified,
}

impl RecoveryStrategyType {
    pub const ALL: [RecoveryStrategyType; 7] = [
        RecoveryStrategyType::EmergencyStop,
        RecoveryStrategyType::EscalateToHuman,
        RecoveryStrategyType::RetrySame,
        RecoveryStrategyType::WaitAndRetry,
        RecoveryStrategyType::ReduceScope,
        RecoveryStrategyType::FallbackStrategy,
        RecoveryStrategyType::RetryModified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategyType::EmergencyStop => "EMERGENCY_STOP",
            RecoveryStrategyType::EscalateToHuman => "ESCALATE_TO_HUMAN",
            RecoveryStrategyType::RetrySame => "RETRY_SAME",
            RecoveryStrategyType::WaitAndRetry => "WAIT_AND_RETRY",
            RecoveryStrategyType::ReduceScope => "REDUCE_SCOPE",
            RecoveryStrategyType::FallbackStrategy => "FALLBACK_STRATEGY",
            RecoveryStrategyType::RetryModified => "RETRY_MODIFIED",
        }
    }
}

impl fmt::Display for RecoveryStrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the delay curve between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// No delay between attempts.
    None,
    Fixed,
    Linear,
    Exponential,
}

/// Delay policy between recovery attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackoffStrategy {
    #[serde(rename = "type")]
    pub backoff_type: BackoffType,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Random spread applied around the computed delay, in percent (0 = off).
    pub jitter_percent: u8,
    /// Whether an external optimizer may tune this policy.
    pub adaptive_adjustment: bool,
}

impl BackoffStrategy {
    /// Backoff that never waits.
    pub fn none() -> Self {
        Self {
            backoff_type: BackoffType::None,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
            jitter_percent: 0,
            adaptive_adjustment: false,
        }
    }

    /// Deterministic delay before retry `attempt` (1-based), without jitter.
    ///
    /// Always capped at `max_delay_ms`.
    pub fn base_delay_ms(&self, attempt: u32) -> u64 {
        let attempt = attempt.max(1);
        let raw = match self.backoff_type {
            BackoffType::None => 0.0,
            BackoffType::Fixed => self.initial_delay_ms as f64,
            BackoffType::Linear => {
                self.initial_delay_ms as f64 * (1.0 + self.multiplier * (attempt - 1) as f64)
            }
            BackoffType::Exponential => {
                self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32 - 1)
            }
        };
        (raw.round() as u64).min(self.max_delay_ms)
    }
}

/// Resources a recovery strategy is expected to consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Relative compute cost (1.0 = one normal step execution).
    pub compute_units: f64,
    /// Whether a person must act before the strategy can complete.
    pub human_intervention: bool,
}

/// A recovery strategy returned by the recovery provider.
///
/// Created fresh per lookup; callers may mutate their copy freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryStrategyConfig {
    pub strategy_type: RecoveryStrategyType,
    pub max_attempts: u32,
    pub backoff_strategy: BackoffStrategy,
    pub fallback_actions: Vec<String>,
    /// Higher means more urgent (10 = stop everything).
    pub priority: u8,
    pub timeout_ms: u64,
    pub conditions: Vec<String>,
    pub estimated_success_rate: f64,
    pub resource_requirements: ResourceRequirements,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff(backoff_type: BackoffType, initial: u64, max: u64, multiplier: f64) -> BackoffStrategy {
        BackoffStrategy {
            backoff_type,
            initial_delay_ms: initial,
            max_delay_ms: max,
            multiplier,
            jitter_percent: 0,
            adaptive_adjustment: false,
        }
    }

    #[test]
    fn test_lookup_key_format() {
        let c = ErrorClassification::new(Severity::Critical, ErrorCategory::Security);
        assert_eq!(c.lookup_key(), "CRITICAL:SECURITY");
    }

    #[test]
    fn test_classification_deserialize_defaults() {
        let c: ErrorClassification =
            serde_json::from_str(r#"{"severity":"ERROR","category":"TRANSIENT"}"#).unwrap();
        assert_eq!(c.severity, Severity::Error);
        assert_eq!(c.recoverability, Recoverability::Unknown);
        assert!(!c.security_risk);
    }

    #[test]
    fn test_classification_security_risk_camel_case() {
        let c: ErrorClassification = serde_json::from_str(
            r#"{"severity":"WARNING","category":"LOGIC","recoverability":"PARTIAL","securityRisk":true}"#,
        )
        .unwrap();
        assert!(c.security_risk);
        assert_eq!(c.recoverability, Recoverability::Partial);
    }

    #[test]
    fn test_severity_and_category_from_str() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("Transient".parse::<ErrorCategory>().unwrap(), ErrorCategory::Transient);
        assert!("mild".parse::<Severity>().is_err());
        assert_eq!("cosmic".parse::<ErrorCategory>().unwrap(), ErrorCategory::Unknown);
    }

    #[test]
    fn test_unrecognized_category_deserializes_as_unknown() {
        let c: ErrorClassification =
            serde_json::from_str(r#"{"severity":"ERROR","category":"NETWORK"}"#).unwrap();
        assert_eq!(c.category, ErrorCategory::Unknown);
        assert_eq!(c.lookup_key(), "ERROR:UNKNOWN");
    }

    #[test]
    fn test_strategy_type_wire_names() {
        let json = serde_json::to_string(&RecoveryStrategyType::EscalateToHuman).unwrap();
        assert_eq!(json, "\"ESCALATE_TO_HUMAN\"");
        for t in RecoveryStrategyType::ALL {
            let wire = serde_json::to_string(&t).unwrap();
            assert_eq!(wire, format!("\"{}\"", t.as_str()));
        }
    }

    #[test]
    fn test_exponential_backoff_doubles_and_caps() {
        let b = backoff(BackoffType::Exponential, 100, 5_000, 2.0);
        assert_eq!(b.base_delay_ms(1), 100);
        assert_eq!(b.base_delay_ms(2), 200);
        assert_eq!(b.base_delay_ms(3), 400);
        assert_eq!(b.base_delay_ms(10), 5_000);
    }

    #[test]
    fn test_linear_backoff_grows_by_step() {
        let b = backoff(BackoffType::Linear, 500, 10_000, 1.0);
        assert_eq!(b.base_delay_ms(1), 500);
        assert_eq!(b.base_delay_ms(2), 1_000);
        assert_eq!(b.base_delay_ms(3), 1_500);
        assert_eq!(b.base_delay_ms(100), 10_000);
    }

    #[test]
    fn test_fixed_and_none_backoff() {
        let fixed = backoff(BackoffType::Fixed, 250, 1_000, 3.0);
        assert_eq!(fixed.base_delay_ms(1), 250);
        assert_eq!(fixed.base_delay_ms(7), 250);
        assert_eq!(BackoffStrategy::none().base_delay_ms(5), 0);
    }

    #[test]
    fn test_attempt_zero_treated_as_first() {
        let b = backoff(BackoffType::Exponential, 100, 5_000, 2.0);
        assert_eq!(b.base_delay_ms(0), 100);
    }
}
