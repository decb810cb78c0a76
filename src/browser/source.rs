//! chromiumoxide implementation of the live state traits

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use chromiumoxide_cdp::cdp::browser_protocol::page::CaptureScreenshotFormat;
use tracing::trace;

use super::BrowserError;
use crate::live::{ItemHandle, LiveStateSource, ScrollOptions};
use crate::utils::WaitResult;

const IS_VISIBLE_FN: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    const style = window.getComputedStyle(this); \
    return rect.width > 0 && rect.height > 0 \
        && style.visibility !== 'hidden' && style.display !== 'none'; \
}";

const IS_ENABLED_FN: &str = "function() { return !this.disabled && this.getAttribute('aria-disabled') !== 'true'; }";

const IS_IN_VIEWPORT_FN: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    return rect.top >= 0 && rect.left >= 0 \
        && rect.bottom <= (window.innerHeight || document.documentElement.clientHeight) \
        && rect.right <= (window.innerWidth || document.documentElement.clientWidth); \
}";

/// A page queried with CSS selectors
#[derive(Clone)]
pub struct PageSource {
    page: Page,
}

impl PageSource {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }
}

#[async_trait]
impl LiveStateSource for PageSource {
    type Handle = ElementHandle;

    async fn fetch_one(&self, query: &str) -> WaitResult<Option<ElementHandle>> {
        Ok(self.fetch_many(query).await?.into_iter().next())
    }

    async fn fetch_many(&self, query: &str) -> WaitResult<Vec<ElementHandle>> {
        let elements = self.page.find_elements(query).await?;
        trace!(query, count = elements.len(), "Fetched elements");
        Ok(elements.into_iter().map(ElementHandle::new).collect())
    }

    async fn screenshot(&self) -> WaitResult<Option<Vec<u8>>> {
        Ok(Some(capture_screenshot(&self.page).await?))
    }
}

/// Element handle, cheap to clone
#[derive(Clone)]
pub struct ElementHandle {
    element: Arc<Element>,
}

impl ElementHandle {
    pub fn new(element: Element) -> Self {
        Self {
            element: Arc::new(element),
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    async fn call(&self, function_declaration: String) -> WaitResult<Option<serde_json::Value>> {
        let returns = self
            .element
            .call_js_fn(function_declaration, false)
            .await
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?;
        Ok(returns.result.value)
    }
}

#[async_trait]
impl ItemHandle for ElementHandle {
    async fn text(&self) -> WaitResult<String> {
        Ok(self.element.inner_text().await?.unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> WaitResult<Option<String>> {
        Ok(self.element.attribute(name).await?)
    }

    async fn act(&self) -> WaitResult<()> {
        self.element.click().await?;
        Ok(())
    }

    async fn is_visible(&self) -> WaitResult<bool> {
        let value = self.call(IS_VISIBLE_FN.to_string()).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn is_enabled(&self) -> WaitResult<bool> {
        let value = self.call(IS_ENABLED_FN.to_string()).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn is_in_viewport(&self) -> WaitResult<bool> {
        let value = self.call(IS_IN_VIEWPORT_FN.to_string()).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn scroll_into_view(&self, options: ScrollOptions) -> WaitResult<()> {
        self.call(format!(
            "function() {{ this.scrollIntoView({}); }}",
            options.to_js()
        ))
        .await?;
        Ok(())
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> WaitResult<()> {
        self.call(format!(
            "function() {{ this.scrollLeft += {dx}; this.scrollTop += {dy}; }}"
        ))
        .await?;
        Ok(())
    }
}

/// Full-page PNG screenshot
pub async fn capture_screenshot(page: &Page) -> WaitResult<Vec<u8>> {
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(true)
        .build();

    let png = page
        .screenshot(params)
        .await
        .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))?;
    Ok(png)
}
