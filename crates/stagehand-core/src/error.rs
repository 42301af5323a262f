//! Error types for Stagehand

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate registration: {category} '{name}'")]
    DuplicateRegistration { category: String, name: String },

    #[error("invalid requirement at index {index}: {detail}")]
    InvalidRequirement { index: usize, detail: String },

    #[error("invalid contract for '{name}': {detail}")]
    InvalidContract { name: String, detail: String },

    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),

    #[error("component not found: {category} '{name}'")]
    ComponentNotFound { category: String, name: String },

    #[error("initialization failed: {category} '{name}': {cause}")]
    InitFailed {
        category: String,
        name: String,
        cause: String,
    },

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("input resolution failed: {0}")]
    InputResolution(String),

    #[error("registry is {state}, expected {expected}")]
    BadRegistryState { state: String, expected: String },

    #[error("fatal: component '{component}': {message}")]
    Fatal { component: String, message: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn duplicate_registration(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            category: category.into(),
            name: name.into(),
        }
    }

    pub fn invalid_contract(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvalidContract {
            name: name.into(),
            detail: detail.into(),
        }
    }

    pub fn init_failed(
        category: impl Into<String>,
        name: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self::InitFailed {
            category: category.into(),
            name: name.into(),
            cause: cause.into(),
        }
    }

    pub fn fatal(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fatal {
            component: component.into(),
            message: message.into(),
        }
    }
}
