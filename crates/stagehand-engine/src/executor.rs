//! The execution wrapper — one planned step in, one execution record out.
//!
//! Every call to a component's execute goes through here: resolve the
//! component, extract and validate inputs, time the call, classify any
//! failure, and drive the bounded retry loop. Plans run strictly
//! sequentially; retries are suspensions on the same logical task, with the
//! backoff wait itself abortable. Only `Retriable` loops locally — every
//! other severity is terminal for the step and hands control back with a
//! distinguishing status.

use crate::context::ContextStore;
use crate::inputs::resolve_inputs;
use crate::plan::{ExecutionPlan, PlannedStep};
use crate::record::{ExecutionError, ExecutionRecord, ExecutionResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stagehand_core::{
    Component, ComponentCall, ErrorClassification, Error, FailureContext, Result, Severity,
};
use stagehand_registry::{Category, ComponentRegistry};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Terminal status of a plan run. Fatal conditions are not a status; they
/// propagate as a raw error, bypassing the graceful-reporting path.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PlanStatus {
    /// Every step ran to success.
    Completed,
    /// Discard remaining steps and request a new plan; the triggering
    /// classification travels along as guidance.
    Replan { guidance: ErrorClassification },
    /// Redo the original task's component selection.
    Reclassify { guidance: ErrorClassification },
    /// The plan was halted; the history holds the partial results.
    Aborted,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Replan { .. } => write!(f, "replan"),
            Self::Reclassify { .. } => write!(f, "reclassify"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

enum StepSignal {
    Continue,
    Replan(ErrorClassification),
    Reclassify(ErrorClassification),
    Abort,
}

/// Drives one plan at a time against a ready registry.
///
/// The record history is owned by the orchestrating caller and appended to
/// as steps complete, so it survives aborts, cancellation, and fatal
/// unwinds. Multiple runners may share one registry; they do not share
/// history.
pub struct PlanRunner {
    registry: Arc<ComponentRegistry>,
    run_id: String,
}

impl PlanRunner {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            run_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Execute the plan's steps in order. Returns the terminal status, or
    /// an error only for fatal classifications.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        store: &mut dyn ContextStore,
        history: &mut Vec<ExecutionRecord>,
        cancel: CancellationToken,
    ) -> Result<PlanStatus> {
        info!(run_id = %self.run_id, steps = plan.len(), "plan execution started");

        for step in plan.steps() {
            if cancel.is_cancelled() {
                info!(run_id = %self.run_id, step = %step.context_key, "run cancelled before step");
                return Ok(PlanStatus::Aborted);
            }

            match self.run_step(step, store, history, &cancel).await? {
                StepSignal::Continue => {}
                StepSignal::Replan(guidance) => {
                    info!(run_id = %self.run_id, step = %step.context_key, "replanning requested");
                    return Ok(PlanStatus::Replan { guidance });
                }
                StepSignal::Reclassify(guidance) => {
                    info!(run_id = %self.run_id, step = %step.context_key, "reclassification requested");
                    return Ok(PlanStatus::Reclassify { guidance });
                }
                StepSignal::Abort => {
                    warn!(run_id = %self.run_id, step = %step.context_key, "plan aborted");
                    return Ok(PlanStatus::Aborted);
                }
            }
        }

        info!(run_id = %self.run_id, records = history.len(), "plan completed");
        Ok(PlanStatus::Completed)
    }

    /// Turn one planned step into exactly one execution record.
    async fn run_step(
        &self,
        step: &PlannedStep,
        store: &mut dyn ContextStore,
        history: &mut Vec<ExecutionRecord>,
        cancel: &CancellationToken,
    ) -> Result<StepSignal> {
        let started = Utc::now();

        // Component-not-found is never retriable.
        let Some(component) = self.lookup(&step.component) else {
            let classification = ErrorClassification::critical(format!(
                "component '{}' not found in registry",
                step.component
            ));
            let message = classification.user_message.clone();
            self.append_failure(history, step, started, message, classification);
            return Ok(StepSignal::Abort);
        };

        // Input extraction failures surface as critical, before any attempt.
        let inputs = match resolve_inputs(step, component.as_ref(), store) {
            Ok(inputs) => inputs,
            Err(e) => {
                let classification = ErrorClassification::critical(format!(
                    "input extraction for '{}' failed: {}",
                    step.component, e
                ));
                let message = e.to_string();
                self.append_failure(history, step, started, message, classification);
                return Ok(StepSignal::Abort);
            }
        };

        let policy = component.retry_policy();
        let step_clock = Instant::now();
        let mut attempt: u32 = 1;

        loop {
            debug!(run_id = %self.run_id, step = %step.context_key,
                   component = %step.component, attempt, "executing step");
            let call = ComponentCall {
                context_key: step.context_key.clone(),
                objective: step.objective.clone(),
                inputs: inputs.clone(),
                parameters: step.parameters.clone(),
            };

            match component.execute(call).await {
                Ok(data) => {
                    let ended = Utc::now();
                    self.store_output(step, component.as_ref(), store, &data);
                    let result = ExecutionResult::succeeded(data, started, ended);
                    info!(run_id = %self.run_id, step = %step.context_key,
                          elapsed_ms = step_clock.elapsed().as_millis() as u64,
                          attempt, "step succeeded");
                    history.push(ExecutionRecord::new(step.clone(), result));
                    return Ok(StepSignal::Continue);
                }
                Err(err) => {
                    // Classified fresh on every attempt: metadata such as
                    // elapsed time changes between attempts.
                    let run_state = self.run_state_snapshot(history);
                    let ctx = FailureContext {
                        component: &step.component,
                        attempt,
                        elapsed: step_clock.elapsed(),
                        run_state: &run_state,
                    };
                    let classification = component.classify_error(&err, &ctx);
                    warn!(run_id = %self.run_id, step = %step.context_key,
                          attempt, severity = %classification.severity,
                          "step attempt failed: {}", err);

                    match classification.severity {
                        Severity::Retriable if attempt < policy.max_attempts => {
                            let delay = policy.delay_for(attempt);
                            debug!(run_id = %self.run_id, step = %step.context_key,
                                   delay_ms = delay.as_millis() as u64, "backing off before retry");
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = cancel.cancelled() => {
                                    info!(run_id = %self.run_id, step = %step.context_key,
                                          "cancelled during backoff");
                                    self.append_failure(
                                        history, step, started, err.message.clone(), classification,
                                    );
                                    return Ok(StepSignal::Abort);
                                }
                            }
                            attempt += 1;
                        }
                        Severity::Retriable => {
                            // Retry budget exhausted, escalate to critical.
                            let escalated = ErrorClassification::critical(format!(
                                "retry budget exhausted after {} attempts: {}",
                                attempt, classification.user_message
                            ))
                            .with_meta("attempts", attempt)
                            .with_meta("max_attempts", policy.max_attempts);
                            self.append_failure(history, step, started, err.message.clone(), escalated);
                            return Ok(StepSignal::Abort);
                        }
                        Severity::Replanning => {
                            self.append_failure(history, step, started, err.message.clone(), classification.clone());
                            return Ok(StepSignal::Replan(classification));
                        }
                        Severity::Reclassification => {
                            self.append_failure(history, step, started, err.message.clone(), classification.clone());
                            return Ok(StepSignal::Reclassify(classification));
                        }
                        Severity::Critical => {
                            self.append_failure(history, step, started, err.message.clone(), classification);
                            return Ok(StepSignal::Abort);
                        }
                        Severity::Fatal => {
                            // The run's state may be corrupt: no record, no
                            // graceful reporting. Propagate raw.
                            error!(run_id = %self.run_id, step = %step.context_key,
                                   "fatal failure: {}", err);
                            return Err(Error::fatal(step.component.clone(), err.message));
                        }
                    }
                }
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.registry
            .resolve(Category::Capabilities, name)
            .or_else(|| self.registry.resolve(Category::Infrastructure, name))
    }

    fn store_output(
        &self,
        step: &PlannedStep,
        component: &dyn Component,
        store: &mut dyn ContextStore,
        data: &Value,
    ) {
        let output_type = step
            .expected_output
            .clone()
            .or_else(|| component.provides().into_iter().next());
        match output_type {
            Some(type_id) => store.store(&type_id, &step.context_key, data.clone()),
            None => debug!(step = %step.context_key, "no output type declared, result not stored"),
        }
    }

    fn append_failure(
        &self,
        history: &mut Vec<ExecutionRecord>,
        step: &PlannedStep,
        started: chrono::DateTime<Utc>,
        message: String,
        classification: ErrorClassification,
    ) {
        let result = ExecutionResult::failed(
            ExecutionError {
                message,
                classification,
            },
            started,
            Utc::now(),
        );
        history.push(ExecutionRecord::new(step.clone(), result));
    }

    /// Read-only snapshot of shared run state for `classify_error`.
    fn run_state_snapshot(&self, history: &[ExecutionRecord]) -> Value {
        json!({
            "run_id": self.run_id,
            "steps_completed": history.len(),
            "history": history
                .iter()
                .map(|r| json!({
                    "context_key": r.step.context_key,
                    "component": r.step.component,
                    "success": r.result.success,
                }))
                .collect::<Vec<_>>(),
        })
    }
}
