//! Browser instance manager for a test run
//!
//! One `BrowserManager` is constructed at start-up and shared (behind an
//! `Arc`) by the steps of a run. It launches Chrome lazily, health-checks it
//! on every access and relaunches it after a crash.
//!
//! # Async Lock Requirements
//!
//! Must use `tokio::sync::Mutex`: browser operations are async and the lock
//! is held across `.await` points.

use anyhow::Result;
use chromiumoxide::page::Page;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::BrowserConfig;
use crate::browser::{BrowserError, BrowserWrapper, PageSource, get_current_page, launch_browser};

pub struct BrowserManager {
    config: BrowserConfig,
    browser: Arc<Mutex<Option<BrowserWrapper>>>,
    current_page: Arc<Mutex<Option<Page>>>,
}

impl BrowserManager {
    /// Browser is launched on first `get_or_launch()` call
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: Arc::new(Mutex::new(None)),
            current_page: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Get or launch the shared browser instance
    ///
    /// An existing browser is checked with a `version()` CDP call; if that
    /// fails the crashed instance is closed and a new one launched.
    ///
    /// # Returns
    /// Arc to the browser Mutex - caller locks it to access BrowserWrapper
    pub async fn get_or_launch(&self) -> Result<Arc<Mutex<Option<BrowserWrapper>>>> {
        let mut guard = self.browser.lock().await;

        if let Some(wrapper) = guard.as_ref() {
            match wrapper.browser().version().await {
                Ok(_) => {
                    debug!("Browser health check passed, reusing existing browser");
                    drop(guard);
                    return Ok(self.browser.clone());
                }
                Err(e) => {
                    warn!("Browser health check failed: {}. Triggering recovery...", e);

                    if let Some(mut crashed) = guard.take() {
                        // Process may already be gone
                        let _ = crashed.browser_mut().close().await;
                        let _ = crashed.browser_mut().wait().await;
                        crashed.cleanup_temp_dir();
                    }
                    *self.current_page.lock().await = None;
                }
            }
        }

        info!("Launching browser (first time or after recovery)");
        let (browser, handler, user_data_dir) = launch_browser(&self.config).await?;
        *guard = Some(BrowserWrapper::new(browser, handler, user_data_dir));
        drop(guard);

        Ok(self.browser.clone())
    }

    /// Open `url` in a new page and make it the current page
    pub async fn open(&self, url: &str) -> Result<PageSource> {
        let browser_arc = self.get_or_launch().await?;
        let page = {
            let guard = browser_arc.lock().await;
            let wrapper = guard
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Browser not available after launch"))?;
            wrapper
                .browser()
                .new_page(url)
                .await
                .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?
        };

        info!(url, "Opened page");
        self.set_current_page(page.clone()).await;
        Ok(PageSource::new(page))
    }

    /// Live state source over the current page
    ///
    /// Falls back to the browser's first page when none was set explicitly.
    pub async fn page_source(&self) -> Result<PageSource> {
        if let Some(page) = self.get_current_page().await {
            return Ok(PageSource::new(page));
        }

        let browser_arc = self.get_or_launch().await?;
        let guard = browser_arc.lock().await;
        let wrapper = guard
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Browser not available after launch"))?;
        let page = get_current_page(wrapper).await?;
        drop(guard);

        self.set_current_page(page.clone()).await;
        Ok(PageSource::new(page))
    }

    /// Close the browser and remove its profile directory
    ///
    /// Both `close()` and `wait()` are needed: dropping the wrapper only
    /// aborts the handler task and would leave a zombie Chrome process.
    /// Safe to call multiple times.
    pub async fn shutdown(&self) -> Result<()> {
        *self.current_page.lock().await = None;
        let mut guard = self.browser.lock().await;

        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down browser");

            if let Err(e) = wrapper.browser_mut().close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = wrapper.browser_mut().wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            wrapper.cleanup_temp_dir();
        }

        Ok(())
    }

    pub async fn get_current_page(&self) -> Option<Page> {
        self.current_page.lock().await.clone()
    }

    pub async fn set_current_page(&self, page: Page) {
        *self.current_page.lock().await = Some(page);
    }

    pub async fn is_browser_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }
}
