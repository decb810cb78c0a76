//! Browser lifecycle wrapper
//!
//! Handles launching chromiumoxide browser instances for test runs and
//! cleaning up after them.

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::BrowserConfig;

/// Wrapper for Browser and its event handler task
///
/// Ensures handler is properly cleaned up when browser is dropped.
/// Handler MUST be aborted to prevent it running indefinitely after
/// browser is closed.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    pub(crate) fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// Remove the profile directory
    ///
    /// MUST be called AFTER `browser.wait()` completes so Chrome has released
    /// its file handles.
    pub fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        info!("Dropping BrowserWrapper - aborting handler task");
        self.handler.abort();

        if let Some(path) = &self.user_data_dir {
            warn!(
                "BrowserWrapper dropped without explicit cleanup. \
                Temp directory will be orphaned: {}. \
                Call BrowserManager::shutdown() before dropping.",
                path.display()
            );
        }
    }
}

/// Launch a browser for a test run with its own profile directory
///
/// Returns (Browser, handler task, profile dir); the profile dir must be
/// removed once the browser has exited.
pub async fn launch_browser(config: &BrowserConfig) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    info!("Launching test browser");

    let user_data_dir = std::env::temp_dir().join(format!("kodegen_wait_{}", std::process::id()));

    let (browser, handler) = crate::browser_setup::launch_browser(config, Some(user_data_dir.clone())).await?;

    Ok((browser, handler, user_data_dir))
}

/// First open page, or an error when none exists yet
pub async fn get_current_page(wrapper: &BrowserWrapper) -> Result<Page> {
    let pages = wrapper
        .browser()
        .pages()
        .await
        .context("Failed to get browser pages")?;

    pages
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No page loaded. Navigate to the application under test first."))
}
