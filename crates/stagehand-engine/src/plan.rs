//! Execution plans — ordered steps with validated context references.
//!
//! A plan is produced by an external planner and consumed read-only here.
//! Construction validates the two plan invariants before anything runs:
//! context keys are unique across the plan, and a step's inputs may only
//! reference keys produced by strictly earlier steps or present before
//! execution started.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stagehand_core::{Error, Result};
use std::collections::{BTreeMap, HashSet};

/// One declared input: which context slot supplies which type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInput {
    pub type_id: String,
    pub context_key: String,
}

impl StepInput {
    pub fn new(type_id: impl Into<String>, context_key: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            context_key: context_key.into(),
        }
    }
}

/// One unit of planned work.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Where this step's output lands. Unique within the plan.
    pub context_key: String,
    /// Name of the component to run.
    pub component: String,
    pub objective: String,
    pub success_criteria: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default)]
    pub inputs: Vec<StepInput>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Value>,
}

impl PlannedStep {
    pub fn new(context_key: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            context_key: context_key.into(),
            component: component.into(),
            objective: String::new(),
            success_criteria: String::new(),
            expected_output: None,
            inputs: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = objective.into();
        self
    }

    pub fn success_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.success_criteria = criteria.into();
        self
    }

    pub fn expected_output(mut self, type_id: impl Into<String>) -> Self {
        self.expected_output = Some(type_id.into());
        self
    }

    pub fn input(mut self, type_id: impl Into<String>, context_key: impl Into<String>) -> Self {
        self.inputs.push(StepInput::new(type_id, context_key));
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

#[derive(Deserialize)]
struct PlanDoc {
    #[serde(default)]
    preloaded: Vec<String>,
    steps: Vec<PlannedStep>,
}

/// An ordered, validated sequence of steps.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "PlanDoc")]
pub struct ExecutionPlan {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    preloaded: Vec<String>,
    steps: Vec<PlannedStep>,
}

impl TryFrom<PlanDoc> for ExecutionPlan {
    type Error = Error;

    fn try_from(doc: PlanDoc) -> Result<Self> {
        Self::with_preloaded(doc.steps, doc.preloaded)
    }
}

impl ExecutionPlan {
    /// Validate a plan with no ambient context.
    pub fn new(steps: Vec<PlannedStep>) -> Result<Self> {
        Self::with_preloaded(steps, Vec::<String>::new())
    }

    /// Validate a plan whose inputs may also reference context keys present
    /// before execution starts.
    pub fn with_preloaded(
        steps: Vec<PlannedStep>,
        preloaded: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let preloaded: Vec<String> = preloaded.into_iter().map(Into::into).collect();
        let mut available: HashSet<&str> = preloaded.iter().map(String::as_str).collect();
        let mut produced: HashSet<&str> = HashSet::new();

        for (index, step) in steps.iter().enumerate() {
            if step.context_key.trim().is_empty() {
                return Err(Error::InvalidPlan(format!(
                    "step {} has an empty context key",
                    index
                )));
            }
            if step.component.trim().is_empty() {
                return Err(Error::InvalidPlan(format!(
                    "step {} ('{}') names no component",
                    index, step.context_key
                )));
            }
            for input in &step.inputs {
                if !available.contains(input.context_key.as_str()) {
                    let reason = if input.context_key == step.context_key {
                        "a step may not reference its own output"
                    } else {
                        "inputs may only reference earlier steps or preloaded context"
                    };
                    return Err(Error::InvalidPlan(format!(
                        "step {} ('{}') references context key '{}' — {}",
                        index, step.context_key, input.context_key, reason
                    )));
                }
            }
            if !produced.insert(&step.context_key) {
                return Err(Error::InvalidPlan(format!(
                    "duplicate context key '{}' at step {}",
                    step.context_key, index
                )));
            }
            available.insert(&step.context_key);
        }

        Ok(Self { preloaded, steps })
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn preloaded(&self) -> &[String] {
        &self.preloaded
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_forward_reference() {
        let steps = vec![
            PlannedStep::new("first", "respond").input("reply", "second"),
            PlannedStep::new("second", "respond"),
        ];
        let err = ExecutionPlan::new(steps).unwrap_err();
        assert!(err.to_string().contains("second"));
    }

    #[test]
    fn rejects_self_reference() {
        let steps = vec![PlannedStep::new("only", "respond").input("reply", "only")];
        let err = ExecutionPlan::new(steps).unwrap_err();
        assert!(err.to_string().contains("own output"));
    }

    #[test]
    fn rejects_duplicate_context_keys() {
        let steps = vec![
            PlannedStep::new("twice", "respond"),
            PlannedStep::new("twice", "clarify"),
        ];
        let err = ExecutionPlan::new(steps).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn accepts_backward_and_preloaded_references() {
        let steps = vec![
            PlannedStep::new("extracted", "task-extractor").input("request", "user_request"),
            PlannedStep::new("reply", "respond").input("task", "extracted"),
        ];
        let plan = ExecutionPlan::with_preloaded(steps, ["user_request"]).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn json_loading_validates() {
        let good = r#"{
            "preloaded": ["user_request"],
            "steps": [
                {"context_key": "reply", "component": "respond",
                 "objective": "answer", "success_criteria": "non-empty",
                 "inputs": [{"type_id": "request", "context_key": "user_request"}]}
            ]
        }"#;
        let plan: ExecutionPlan = serde_json::from_str(good).unwrap();
        assert_eq!(plan.steps()[0].component, "respond");

        let bad = r#"{
            "steps": [
                {"context_key": "a", "component": "respond",
                 "objective": "", "success_criteria": "",
                 "inputs": [{"type_id": "t", "context_key": "later"}]},
                {"context_key": "later", "component": "respond",
                 "objective": "", "success_criteria": ""}
            ]
        }"#;
        assert!(serde_json::from_str::<ExecutionPlan>(bad).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let plan = ExecutionPlan::with_preloaded(
            vec![PlannedStep::new("reply", "respond")
                .objective("answer")
                .success_criteria("non-empty")
                .expected_output("reply")
                .input("request", "user_request")
                .parameter("tone", "brief")],
            ["user_request"],
        )
        .unwrap();
        let json = serde_json::to_string(&plan).unwrap();
        let back: ExecutionPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.steps()[0].parameters["tone"], "brief");
        assert_eq!(back.preloaded(), plan.preloaded());
    }
}
