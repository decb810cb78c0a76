//! Polling wait engine for browser UI automation
//!
//! Provides a condition poller, a locate-and-act retry loop for virtualised
//! collections, and grid/element helpers built on them, with a chromiumoxide
//! backed live state source.

mod browser;
pub mod browser_setup;
pub mod grid;
pub mod live;
pub mod logging;
mod manager;
pub mod report;
mod utils;
pub mod wait;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::utils::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_REVEAL_STEP_PX,
    DEFAULT_SETTLE_DELAY_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wait: WaitConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub grid: grid::GridSelectors,
}

/// Default condition poll settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Fail a wait as soon as its condition raises instead of retrying
    #[serde(default)]
    pub strict: bool,
}

/// Default locate-and-act settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_reveal_step_px")]
    pub reveal_step_px: f64,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default)]
    pub strict: bool,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}
fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}
fn default_reveal_step_px() -> f64 {
    DEFAULT_REVEAL_STEP_PX
}
fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

fn default_headless() -> bool {
    true
}

fn default_disable_security() -> bool {
    false
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            interval_ms: default_interval_ms(),
            strict: false,
        }
    }
}

impl WaitConfig {
    pub fn policy(&self) -> WaitResult<WaitPolicy> {
        let timeout = validate_wait_timeout(Some(self.timeout_ms), DEFAULT_WAIT_TIMEOUT_MS)?;
        let policy = WaitPolicy::new(timeout, Duration::from_millis(self.interval_ms))
            .with_mode(mode(self.strict));
        policy.validate()?;
        Ok(policy)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            reveal_step_px: default_reveal_step_px(),
            settle_delay_ms: default_settle_delay_ms(),
            strict: false,
        }
    }
}

impl SearchConfig {
    pub fn policy(&self) -> WaitResult<RetrySearchPolicy> {
        let settle_delay = validate_interaction_timeout(Some(self.settle_delay_ms), DEFAULT_SETTLE_DELAY_MS)?;
        let policy = RetrySearchPolicy::new(self.max_attempts, self.reveal_step_px, settle_delay)
            .with_mode(mode(self.strict));
        policy.validate()?;
        Ok(policy)
    }
}

fn mode(strict: bool) -> ConditionMode {
    if strict {
        ConditionMode::Strict
    } else {
        ConditionMode::Forgiving
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            disable_security: default_disable_security(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

/// Load configuration from a YAML file; a missing file yields defaults
pub fn load_yaml_config(path: impl AsRef<Path>) -> WaitResult<Config> {
    let path = path.as_ref();

    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

pub use browser::{
    BrowserError, BrowserWrapper, ElementHandle, PageSource, capture_screenshot,
    download_managed_browser, find_browser_executable, launch_browser,
};
pub use grid::{Grid, GridSelectors};
pub use live::{ItemHandle, LiveStateSource, ScrollAlign, ScrollOptions};
pub use manager::BrowserManager;
pub use report::{MemoryReporter, ReportEvent, Reporter, StepOutcome, TracingReporter};
pub use utils::constants;
pub use utils::{
    WaitError, WaitResult, exists_within, scroll_to_element, validate_interaction_timeout,
    validate_wait_timeout, wait_for_absent, wait_for_element, wait_for_element_at,
    wait_for_elements, wait_for_enabled, wait_for_hidden, wait_for_visible,
};
pub use wait::{
    Clock, ConditionMode, RetrySearchPolicy, SearchOutcome, TokioClock, WaitEngine, WaitPolicy,
    locate_and_act, poll, resolve_index,
};
