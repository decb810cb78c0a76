use std::time::Duration;

use thiserror::Error;

use crate::browser::BrowserError;

/// Errors produced by the wait engine and the helpers built on it
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaitError {
    /// Deadline elapsed before the condition held
    #[error("Timed out after {}ms: {}", .elapsed.as_millis(), .message.as_deref().unwrap_or("condition was not met"))]
    Timeout {
        elapsed: Duration,
        message: Option<String>,
    },

    /// The condition or predicate itself failed (strict mode only)
    #[error("Condition evaluation failed: {0}")]
    Condition(String),

    /// The live state source query failed. Never retried.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The act step on a matched item failed
    #[error("Action failed: {0}")]
    Action(String),

    #[error("Not found: {target}")]
    NotFound { target: String },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl WaitError {
    pub fn timeout(elapsed: Duration, message: Option<String>) -> Self {
        WaitError::Timeout { elapsed, message }
    }

    pub fn not_found(target: impl Into<String>) -> Self {
        WaitError::NotFound {
            target: target.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WaitError::NotFound { .. })
    }
}

/// Browser faults surface as fetch failures: the live state source broke
impl From<BrowserError> for WaitError {
    fn from(err: BrowserError) -> Self {
        WaitError::Fetch(err.to_string())
    }
}

impl From<chromiumoxide::error::CdpError> for WaitError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        WaitError::Fetch(err.to_string())
    }
}

impl From<serde_yaml::Error> for WaitError {
    fn from(err: serde_yaml::Error) -> Self {
        WaitError::Config(err.to_string())
    }
}

impl From<std::io::Error> for WaitError {
    fn from(err: std::io::Error) -> Self {
        WaitError::Config(err.to_string())
    }
}

/// Result type for wait engine operations
pub type WaitResult<T> = Result<T, WaitError>;
