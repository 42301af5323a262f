//! Stagehand Engine - plan execution with classification-driven recovery

pub mod context;
pub mod executor;
pub mod inputs;
pub mod plan;
pub mod record;
pub mod report;

pub use context::{ContextStore, MemoryStore};
pub use executor::{PlanRunner, PlanStatus};
pub use inputs::resolve_inputs;
pub use plan::{ExecutionPlan, PlannedStep, StepInput};
pub use record::{ExecutionError, ExecutionRecord, ExecutionResult};
pub use report::render_report;
