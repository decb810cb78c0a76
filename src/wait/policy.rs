//! Immutable policies governing a single wait or search call

use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_REVEAL_STEP_PX,
    DEFAULT_SETTLE_DELAY_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use crate::utils::{WaitError, WaitResult};

/// How a failing condition or predicate evaluation is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionMode {
    /// Count the failure as "not yet true" and keep going
    #[default]
    Forgiving,
    /// Fail the call immediately with `WaitError::Condition`
    Strict,
}

/// Deadline and cadence of a condition poll
///
/// An `interval` longer than `timeout` is allowed; the poll then degrades to
/// the single immediate evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
    pub on_timeout_message: Option<String>,
    pub mode: ConditionMode,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            on_timeout_message: None,
            mode: ConditionMode::Forgiving,
        }
    }

    pub fn from_millis(timeout_ms: u64, interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(interval_ms),
        )
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.on_timeout_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ConditionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn strict(self) -> Self {
        self.with_mode(ConditionMode::Strict)
    }

    pub fn validate(&self) -> WaitResult<()> {
        if self.interval.is_zero() {
            return Err(WaitError::InvalidPolicy(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::from_millis(DEFAULT_WAIT_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS)
    }
}

/// Bounds of a locate-and-act search
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySearchPolicy {
    pub max_attempts: u32,
    /// Distance handed to the reveal step (pixels for scroll-based reveals)
    pub reveal_step: f64,
    pub settle_delay: Duration,
    pub mode: ConditionMode,
}

impl RetrySearchPolicy {
    pub fn new(max_attempts: u32, reveal_step: f64, settle_delay: Duration) -> Self {
        Self {
            max_attempts,
            reveal_step,
            settle_delay,
            mode: ConditionMode::Forgiving,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ConditionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> WaitResult<()> {
        if self.max_attempts == 0 {
            return Err(WaitError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.reveal_step.is_finite() {
            return Err(WaitError::InvalidPolicy(format!(
                "reveal_step must be finite, got {}",
                self.reveal_step
            )));
        }
        Ok(())
    }
}

impl Default for RetrySearchPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_REVEAL_STEP_PX,
            Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        )
    }
}
