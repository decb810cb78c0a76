//! Timeout validation utilities for wait operations

use std::time::Duration;

use super::constants::{EXTENDED_MAX_TIMEOUT_MS, MAX_TIMEOUT_MS};
use super::errors::{WaitError, WaitResult};

/// Validate the deadline of a general wait (page loads, report generation)
///
/// # Arguments
/// * `timeout_ms` - Optional timeout in milliseconds
/// * `default_ms` - Default timeout if None provided
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err(WaitError::InvalidPolicy)` - If timeout exceeds EXTENDED_MAX_TIMEOUT_MS
///
/// # Example
/// ```rust
/// # use kodegen_tools_wait::validate_wait_timeout;
/// let timeout = validate_wait_timeout(Some(45000), 10000).unwrap();
/// assert_eq!(timeout.as_millis(), 45000);
/// ```
pub fn validate_wait_timeout(timeout_ms: Option<u64>, default_ms: u64) -> WaitResult<Duration> {
    let ms = timeout_ms.unwrap_or(default_ms);

    if ms > EXTENDED_MAX_TIMEOUT_MS {
        return Err(WaitError::InvalidPolicy(format!(
            "Timeout cannot exceed {}ms ({} minutes). Received: {}ms ({:.1} minutes)",
            EXTENDED_MAX_TIMEOUT_MS,
            EXTENDED_MAX_TIMEOUT_MS / 60_000,
            ms,
            ms as f64 / 60_000.0
        )));
    }

    Ok(Duration::from_millis(ms))
}

/// Validate the deadline of an element interaction (click, search, filter)
pub fn validate_interaction_timeout(timeout_ms: Option<u64>, default_ms: u64) -> WaitResult<Duration> {
    let ms = timeout_ms.unwrap_or(default_ms);

    if ms > MAX_TIMEOUT_MS {
        return Err(WaitError::InvalidPolicy(format!(
            "Timeout cannot exceed {}ms ({} seconds). Received: {}ms ({} seconds)",
            MAX_TIMEOUT_MS,
            MAX_TIMEOUT_MS / 1000,
            ms,
            ms / 1000
        )));
    }

    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default() {
        assert_eq!(validate_wait_timeout(None, 4000).unwrap(), Duration::from_millis(4000));
        assert_eq!(
            validate_interaction_timeout(None, 1000).unwrap(),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn rejects_values_above_caps() {
        assert!(matches!(
            validate_wait_timeout(Some(EXTENDED_MAX_TIMEOUT_MS + 1), 0),
            Err(WaitError::InvalidPolicy(_))
        ));
        assert!(matches!(
            validate_interaction_timeout(Some(45_000), 0),
            Err(WaitError::InvalidPolicy(_))
        ));
        assert!(validate_interaction_timeout(Some(MAX_TIMEOUT_MS), 0).is_ok());
    }
}
