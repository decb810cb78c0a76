//! Shared configuration constants for wait operations and browser launch
//!
//! Use the named timeout tiers instead of ad-hoc millisecond values so that
//! waits across the suite stay comparable.

pub const TINY_TIMEOUT_MS: u64 = 100;
pub const SHORT_TIMEOUT_MS: u64 = 1_000;
pub const MEDIUM_TIMEOUT_MS: u64 = 4_000;
pub const LONG_TIMEOUT_MS: u64 = 15_000;
/// Longest wait for a single element interaction
pub const MAX_TIMEOUT_MS: u64 = 30_000;
/// Longest wait of any kind (slow page loads, report generation)
pub const EXTENDED_MAX_TIMEOUT_MS: u64 = 120_000;

/// Default interval between condition evaluations
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Default overall wait deadline
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Upper bound on grid search attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
/// Pixels scrolled per reveal step in a virtualised grid
pub const DEFAULT_REVEAL_STEP_PX: f64 = 200.0;
/// Pause after a reveal step so lazy rows can render
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// MIME type used for screenshot attachments
pub const PNG_MIME: &str = "image/png";
