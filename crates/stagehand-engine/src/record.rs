//! Execution results and records — the append-only audit trail.

use crate::plan::PlannedStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagehand_core::ErrorClassification;

/// A classified step failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionError {
    pub message: String,
    pub classification: ErrorClassification,
}

/// Outcome of one step. Exactly one of `data`/`error` is populated, gated
/// by `success`; the constructors enforce the pairing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
    pub started: DateTime<Utc>,
    pub ended: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl ExecutionResult {
    pub fn succeeded(data: Value, started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            started,
            ended,
            duration_seconds: duration_seconds(started, ended),
        }
    }

    pub fn failed(error: ExecutionError, started: DateTime<Utc>, ended: DateTime<Utc>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            started,
            ended,
            duration_seconds: duration_seconds(started, ended),
        }
    }
}

fn duration_seconds(started: DateTime<Utc>, ended: DateTime<Utc>) -> f64 {
    (ended - started).num_milliseconds().max(0) as f64 / 1000.0
}

/// One completed step: the step as planned plus what happened.
/// Appended to a history list that is never mutated retroactively.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub step: PlannedStep,
    pub started: DateTime<Utc>,
    pub result: ExecutionResult,
}

impl ExecutionRecord {
    pub fn new(step: PlannedStep, result: ExecutionResult) -> Self {
        Self {
            started: result.started,
            step,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use stagehand_core::ErrorClassification;

    #[test]
    fn success_populates_data_only() {
        let started = Utc::now();
        let ended = started + Duration::milliseconds(1500);
        let result = ExecutionResult::succeeded(json!({"ok": true}), started, ended);
        assert!(result.success);
        assert!(result.data.is_some());
        assert!(result.error.is_none());
        assert!((result.duration_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn failure_populates_error_only() {
        let started = Utc::now();
        let result = ExecutionResult::failed(
            ExecutionError {
                message: "boom".into(),
                classification: ErrorClassification::critical("boom"),
            },
            started,
            started,
        );
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error.unwrap().message, "boom");
    }
}
