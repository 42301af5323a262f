//! Stagehand — discrete units of work inside re-plannable execution
//! sequences, with uniform contract validation, execution instrumentation,
//! and error-severity-driven recovery.
//!
//! Facade crate: re-exports the contract (`stagehand-core`), the component
//! registry (`stagehand-registry`), and the execution engine
//! (`stagehand-engine`).

pub use stagehand_core::{
    validate_contract, Cardinality, Component, ComponentCall, ComponentError, ComponentKind,
    ComponentResult, ConstraintMode, Error, ErrorClassification, FailureContext, InputValue,
    RequirementSpec, Result, RetryPolicy, Severity,
};
pub use stagehand_engine::{
    render_report, ContextStore, ExecutionError, ExecutionPlan, ExecutionRecord, ExecutionResult,
    MemoryStore, PlanRunner, PlanStatus, PlannedStep, StepInput,
};
pub use stagehand_registry::{
    default_standalone_set, Category, ComponentRegistry, ConnectorKind, Registration,
    RegistrationSet, RegistryState,
};
