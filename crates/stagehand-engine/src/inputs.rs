//! Declared-input extraction.
//!
//! Resolves a component's requirements against prior context using the
//! step's input list, honoring the constraint mode (hard: every requirement
//! must resolve; soft: at least one) and enforcing cardinality. A violation
//! fails the whole extraction — nothing is partially injected.

use crate::context::ContextStore;
use crate::plan::PlannedStep;
use serde_json::Value;
use stagehand_core::{Cardinality, Component, ConstraintMode, Error, InputValue, Result};
use std::collections::BTreeMap;
use tracing::debug;

pub fn resolve_inputs(
    step: &PlannedStep,
    component: &dyn Component,
    store: &dyn ContextStore,
) -> Result<BTreeMap<String, InputValue>> {
    let requirements = component.requires();
    let mode = component.constraint_mode();
    let mut resolved: BTreeMap<String, InputValue> = BTreeMap::new();
    let mut unresolved: Vec<String> = Vec::new();

    for requirement in &requirements {
        let type_id = requirement.type_id();
        let candidates: Vec<Value> = step
            .inputs
            .iter()
            .filter(|input| input.type_id == type_id)
            .flat_map(|input| store.fetch(type_id, &input.context_key))
            .collect();

        match requirement.cardinality() {
            Cardinality::Single => match candidates.len() {
                0 => unresolved.push(type_id.to_string()),
                1 => {
                    resolved.insert(
                        type_id.to_string(),
                        InputValue::Single(candidates.into_iter().next().unwrap()),
                    );
                }
                n => {
                    return Err(Error::InputResolution(format!(
                        "requirement '{}' expects a single value but {} candidates resolved",
                        type_id, n
                    )));
                }
            },
            Cardinality::Multiple => match candidates.as_slice() {
                [] => unresolved.push(type_id.to_string()),
                [only] if !only.is_array() => {
                    return Err(Error::InputResolution(format!(
                        "requirement '{}' expects multiple values but resolved to a scalar",
                        type_id
                    )));
                }
                [only] => {
                    let items = only.as_array().cloned().unwrap_or_default();
                    resolved.insert(type_id.to_string(), InputValue::Many(items));
                }
                _ => {
                    resolved.insert(type_id.to_string(), InputValue::Many(candidates));
                }
            },
        }
    }

    match mode {
        ConstraintMode::Hard => {
            if let Some(missing) = unresolved.first() {
                return Err(Error::InputResolution(format!(
                    "requirement '{}' did not resolve under hard constraint mode",
                    missing
                )));
            }
        }
        ConstraintMode::Soft => {
            if resolved.is_empty() && !requirements.is_empty() {
                return Err(Error::InputResolution(format!(
                    "no requirement resolved under soft constraint mode ({} declared)",
                    requirements.len()
                )));
            }
            if !unresolved.is_empty() {
                debug!(
                    component = component.name(),
                    missing = ?unresolved,
                    "soft-mode requirements left unresolved"
                );
            }
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryStore;
    use serde_json::json;
    use stagehand_core::{ComponentCall, ComponentResult, RequirementSpec};

    struct Needy {
        requires: Vec<RequirementSpec>,
        mode: ConstraintMode,
    }

    #[async_trait::async_trait]
    impl Component for Needy {
        fn name(&self) -> &str {
            "needy"
        }
        fn description(&self) -> &str {
            "input extraction probe"
        }
        fn requires(&self) -> Vec<RequirementSpec> {
            self.requires.clone()
        }
        fn constraint_mode(&self) -> ConstraintMode {
            self.mode
        }
        async fn execute(&self, _call: ComponentCall) -> ComponentResult {
            Ok(json!(null))
        }
    }

    fn step_with(inputs: &[(&str, &str)]) -> PlannedStep {
        let mut step = PlannedStep::new("out", "needy");
        for (type_id, key) in inputs {
            step = step.input(*type_id, *key);
        }
        step
    }

    #[test]
    fn single_requirement_resolves() {
        let mut store = MemoryStore::new();
        store.store("document", "d1", json!("text"));
        let needy = Needy {
            requires: vec![RequirementSpec::exact("document")],
            mode: ConstraintMode::Hard,
        };
        let resolved = resolve_inputs(&step_with(&[("document", "d1")]), &needy, &store).unwrap();
        assert_eq!(resolved["document"], InputValue::Single(json!("text")));
    }

    #[test]
    fn single_with_many_candidates_fails() {
        let mut store = MemoryStore::new();
        store.store("document", "d1", json!("one"));
        store.store("document", "d1", json!("two"));
        let needy = Needy {
            requires: vec![RequirementSpec::single("document")],
            mode: ConstraintMode::Hard,
        };
        let err = resolve_inputs(&step_with(&[("document", "d1")]), &needy, &store).unwrap_err();
        assert!(err.to_string().contains("single"));
    }

    #[test]
    fn multiple_with_scalar_fails() {
        let mut store = MemoryStore::new();
        store.store("reading", "r1", json!(42));
        let needy = Needy {
            requires: vec![RequirementSpec::multiple("reading")],
            mode: ConstraintMode::Hard,
        };
        let err = resolve_inputs(&step_with(&[("reading", "r1")]), &needy, &store).unwrap_err();
        assert!(err.to_string().contains("scalar"));
    }

    #[test]
    fn multiple_accepts_array_or_accumulated_values() {
        let mut store = MemoryStore::new();
        store.store("reading", "batch", json!([1, 2, 3]));
        store.store("note", "n", json!("a"));
        store.store("note", "n", json!("b"));
        let needy = Needy {
            requires: vec![
                RequirementSpec::multiple("reading"),
                RequirementSpec::multiple("note"),
            ],
            mode: ConstraintMode::Hard,
        };
        let resolved = resolve_inputs(
            &step_with(&[("reading", "batch"), ("note", "n")]),
            &needy,
            &store,
        )
        .unwrap();
        assert_eq!(
            resolved["reading"],
            InputValue::Many(vec![json!(1), json!(2), json!(3)])
        );
        assert_eq!(resolved["note"], InputValue::Many(vec![json!("a"), json!("b")]));
    }

    #[test]
    fn hard_mode_requires_every_requirement() {
        let store = MemoryStore::new();
        let needy = Needy {
            requires: vec![RequirementSpec::exact("document")],
            mode: ConstraintMode::Hard,
        };
        let err = resolve_inputs(&step_with(&[]), &needy, &store).unwrap_err();
        assert!(err.to_string().contains("hard"));
    }

    #[test]
    fn soft_mode_accepts_partial_resolution() {
        let mut store = MemoryStore::new();
        store.store("document", "d1", json!("text"));
        let needy = Needy {
            requires: vec![
                RequirementSpec::single("document"),
                RequirementSpec::single("summary"),
            ],
            mode: ConstraintMode::Soft,
        };
        let resolved = resolve_inputs(&step_with(&[("document", "d1")]), &needy, &store).unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains_key("document"));
    }

    #[test]
    fn soft_mode_rejects_nothing_resolved() {
        let store = MemoryStore::new();
        let needy = Needy {
            requires: vec![
                RequirementSpec::single("document"),
                RequirementSpec::single("summary"),
            ],
            mode: ConstraintMode::Soft,
        };
        let err = resolve_inputs(&step_with(&[]), &needy, &store).unwrap_err();
        assert!(err.to_string().contains("soft"));
    }

    #[test]
    fn cardinality_violation_fails_even_under_soft_mode() {
        let mut store = MemoryStore::new();
        store.store("document", "d1", json!("one"));
        store.store("document", "d1", json!("two"));
        store.store("summary", "s1", json!("fine"));
        let needy = Needy {
            requires: vec![
                RequirementSpec::single("document"),
                RequirementSpec::single("summary"),
            ],
            mode: ConstraintMode::Soft,
        };
        // "summary" alone would satisfy soft mode, but the violation on
        // "document" fails the extraction outright.
        let err = resolve_inputs(
            &step_with(&[("document", "d1"), ("summary", "s1")]),
            &needy,
            &store,
        )
        .unwrap_err();
        assert!(err.to_string().contains("single"));
    }
}
