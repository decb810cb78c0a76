//! Bring an element into view before interacting with it

use tracing::{debug, warn};

use crate::live::{ItemHandle, LiveStateSource, ScrollOptions};
use crate::utils::WaitResult;
use crate::wait::WaitEngine;

/// Scroll `handle` to the centre of the viewport unless it is already fully
/// visible, wait the engine's settle delay, and report a "Scrolled to ..."
/// step with a screenshot.
///
/// Best effort: failures are logged and yield `false`. Returns `true` only
/// when a scroll was performed.
pub async fn scroll_to_element<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    handle: &S::Handle,
    smooth: bool,
) -> bool {
    match try_scroll_to_element(engine, source, handle, smooth).await {
        Ok(scrolled) => scrolled,
        Err(e) => {
            warn!(error = %e, "Scroll to element failed, continuing");
            false
        }
    }
}

async fn try_scroll_to_element<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    handle: &S::Handle,
    smooth: bool,
) -> WaitResult<bool> {
    if handle.is_in_viewport().await? {
        debug!("Element already in viewport, not scrolling");
        return Ok(false);
    }

    handle
        .scroll_into_view(ScrollOptions {
            smooth,
            ..ScrollOptions::center()
        })
        .await?;
    engine.clock().sleep(engine.search_policy().settle_delay).await;

    let description = format!("Scrolled to {}", element_label(handle).await?);
    engine
        .report_step(&description, async {
            engine.attach_screenshot(source, &description).await;
            Ok(())
        })
        .await?;

    Ok(true)
}

/// Element text, or `element_<classes>` for elements without text
async fn element_label<H: ItemHandle>(handle: &H) -> WaitResult<String> {
    let text = handle.text().await?;
    let text = text.trim();
    if !text.is_empty() {
        return Ok(text.to_string());
    }

    let classes = handle.attribute("class").await?.unwrap_or_default();
    Ok(format!("element_{}", classes.split_whitespace().collect::<Vec<_>>().join("_")))
}
