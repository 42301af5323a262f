//! Retry policies — bounded attempts with multiplicative backoff.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable per-component retry policy.
///
/// The delay before re-attempting grows geometrically:
/// `initial_delay * backoff_factor^(attempt - 1)` after attempt N.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_factor: f64) -> Result<Self> {
        if max_attempts < 1 {
            return Err(Error::InvalidRetryPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        if backoff_factor < 1.0 {
            return Err(Error::InvalidRetryPolicy(format!(
                "backoff_factor must be >= 1.0, got {}",
                backoff_factor
            )));
        }
        Ok(Self {
            max_attempts,
            initial_delay,
            backoff_factor,
        })
    }

    /// Default policy for ordinary components.
    pub fn standard() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            backoff_factor: 1.5,
        }
    }

    /// Default policy for infrastructure components, which are expected to fail fast.
    pub fn infrastructure() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            backoff_factor: 1.2,
        }
    }

    /// Backoff delay after the given 1-based attempt number.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        self.initial_delay.mul_f64(factor)
    }
}
