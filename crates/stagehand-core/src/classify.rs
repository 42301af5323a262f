//! Failure severity and classification — the only recovery vocabulary.
//!
//! Every failure inside a component's execute is routed through
//! `Component::classify_error` and comes back as one of five severities.
//! The execution wrapper branches on nothing else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Recovery severity of a classified failure.
///
/// `Retriable` is the only severity that loops locally; every other value
/// is terminal for the current step and hands control back to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Retry the same step, bounded by the component's retry policy.
    Retriable,
    /// Discard the remaining steps and request a new plan.
    Replanning,
    /// Redo the original task's component selection, not the plan shape.
    Reclassification,
    /// Halt the whole plan; report partial results from the history.
    Critical,
    /// The run's state may be corrupt: propagate raw, bypass reporting.
    Fatal,
}

impl Severity {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Retriable)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retriable => write!(f, "retriable"),
            Self::Replanning => write!(f, "replanning"),
            Self::Reclassification => write!(f, "reclassification"),
            Self::Critical => write!(f, "critical"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// A classified failure: severity, a human-readable message, and ordered
/// metadata. Produced fresh on every failed attempt and never cached,
/// since metadata like elapsed time changes between attempts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorClassification {
    pub severity: Severity,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl ErrorClassification {
    pub fn new(severity: Severity, user_message: impl Into<String>) -> Self {
        Self {
            severity,
            user_message: user_message.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn retriable(msg: impl Into<String>) -> Self {
        Self::new(Severity::Retriable, msg)
    }

    pub fn replanning(msg: impl Into<String>) -> Self {
        Self::new(Severity::Replanning, msg)
    }

    pub fn reclassification(msg: impl Into<String>) -> Self {
        Self::new(Severity::Reclassification, msg)
    }

    pub fn critical(msg: impl Into<String>) -> Self {
        Self::new(Severity::Critical, msg)
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, msg)
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
