//! Browser infrastructure: launching Chrome and exposing its pages as a
//! live state source for the wait engine

mod source;
mod wrapper;

pub use crate::browser_setup::{download_managed_browser, find_browser_executable};
pub use source::{ElementHandle, PageSource, capture_screenshot};
pub use wrapper::{BrowserWrapper, get_current_page, launch_browser};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to find browser executable: {0}")]
    NotFound(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("Script evaluation failed: {0}")]
    ScriptFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),
}
