//! The execution contract — the interface every component must satisfy.
//!
//! Two component kinds exist: ordinary work units and privileged
//! infrastructure units. Both are wrapped by the same execution machinery;
//! the kind only selects defaults (retry policy). The contract is checked
//! once at registration time by `validate_contract`, so the wrapper never
//! has to probe a live instance.

use crate::classify::ErrorClassification;
use crate::error::{Error, Result};
use crate::requirement::{Cardinality, RequirementSpec};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Component kind. Selects the default failure policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Standard,
    Infrastructure,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// How strictly declared requirements bind at input extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintMode {
    /// Every requirement must resolve or extraction fails outright.
    Hard,
    /// At least one requirement must resolve.
    Soft,
}

/// A resolved input value: scalar for single requirements, list for
/// multiple. Never coerced between the two.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Single(Value),
    Many(Vec<Value>),
}

/// Everything a component receives for one call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentCall {
    /// The step's context key, where the output will be stored.
    pub context_key: String,
    /// What this step is trying to accomplish.
    pub objective: String,
    /// Resolved inputs, keyed by type identifier.
    pub inputs: BTreeMap<String, InputValue>,
    /// Step parameters, passed through untouched.
    pub parameters: BTreeMap<String, Value>,
}

/// Failure raised inside a component's execute.
#[derive(thiserror::Error, Clone, Debug)]
#[error("{message}")]
pub struct ComponentError {
    pub message: String,
}

impl ComponentError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ComponentError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ComponentError {
    fn from(message: &str) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ComponentResult = std::result::Result<Value, ComponentError>;

/// Per-failure context handed to `classify_error`. Built fresh for every
/// attempt; `run_state` is a read-only snapshot owned by the caller.
#[derive(Clone, Debug)]
pub struct FailureContext<'a> {
    pub component: &'a str,
    /// 1-based attempt count so far.
    pub attempt: u32,
    /// Elapsed time since the step's first attempt started.
    pub elapsed: Duration,
    /// Read-only snapshot of shared run state (run id, history summary).
    pub run_state: &'a Value,
}

/// The contract. Implement this to add a new component.
///
/// `execute` is the only required operation beyond identity; the failure
/// policy operations have kind-appropriate defaults.
#[async_trait::async_trait]
pub trait Component: Send + Sync {
    /// Unique component name within its registry category.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    fn kind(&self) -> ComponentKind {
        ComponentKind::Standard
    }

    /// Declared input requirements, resolved from context before execute.
    fn requires(&self) -> Vec<RequirementSpec> {
        Vec::new()
    }

    /// Output type identifiers this component produces.
    fn provides(&self) -> Vec<String> {
        Vec::new()
    }

    fn constraint_mode(&self) -> ConstraintMode {
        ConstraintMode::Hard
    }

    /// Execute one call. Inputs have already been validated and injected.
    async fn execute(&self, call: ComponentCall) -> ComponentResult;

    /// Classify a failure into a recovery action. Default: always critical,
    /// for both kinds, since infrastructure failures are system-level and must
    /// not be silently retried unless a component opts in.
    fn classify_error(
        &self,
        error: &ComponentError,
        _ctx: &FailureContext<'_>,
    ) -> ErrorClassification {
        ErrorClassification::critical(format!("component '{}' failed: {}", self.name(), error))
    }

    fn retry_policy(&self) -> RetryPolicy {
        match self.kind() {
            ComponentKind::Standard => RetryPolicy::standard(),
            ComponentKind::Infrastructure => RetryPolicy::infrastructure(),
        }
    }
}

/// One-time self-check run at registration, before any call.
///
/// Rejects empty identity fields, malformed retry policies, and soft-mode
/// requirement lists that mix cardinalities (no precedence is defined for
/// a soft resolution across conflicting cardinalities, so the mix itself
/// is the error).
pub fn validate_contract(component: &dyn Component) -> Result<()> {
    let name = component.name();
    if name.trim().is_empty() {
        return Err(Error::invalid_contract("<unnamed>", "name must be non-empty"));
    }
    if component.description().trim().is_empty() {
        return Err(Error::invalid_contract(name, "description must be non-empty"));
    }

    let policy = component.retry_policy();
    RetryPolicy::new(policy.max_attempts, policy.initial_delay, policy.backoff_factor)
        .map_err(|e| Error::invalid_contract(name, e.to_string()))?;

    let requires = component.requires();
    for spec in &requires {
        if spec.type_id().trim().is_empty() {
            return Err(Error::invalid_contract(
                name,
                "requirement type identifier must be non-empty",
            ));
        }
    }
    if component.constraint_mode() == ConstraintMode::Soft {
        let mixed = requires
            .iter()
            .any(|r| r.cardinality() == Cardinality::Single)
            && requires
                .iter()
                .any(|r| r.cardinality() == Cardinality::Multiple);
        if mixed {
            return Err(Error::invalid_contract(
                name,
                "soft constraint mode requires a uniform cardinality across requirements",
            ));
        }
    }
    Ok(())
}
