//! Stagehand Core - the execution contract, severity model, and error types

pub mod classify;
pub mod contract;
pub mod error;
pub mod requirement;
pub mod retry;

pub use classify::{ErrorClassification, Severity};
pub use contract::{
    validate_contract, Component, ComponentCall, ComponentError, ComponentKind, ComponentResult,
    ConstraintMode, FailureContext, InputValue,
};
pub use error::{Error, Result};
pub use requirement::{parse_requires, Cardinality, RequirementSpec};
pub use retry::RetryPolicy;
