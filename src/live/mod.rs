//! Capability traits over the live UI state
//!
//! The wait engine never owns the page. It reads it through these traits and
//! must assume it changed between any two calls.

use async_trait::async_trait;

use crate::utils::WaitResult;

/// Vertical/horizontal alignment for `scrollIntoView`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

impl ScrollAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollAlign::Start => "start",
            ScrollAlign::Center => "center",
            ScrollAlign::End => "end",
            ScrollAlign::Nearest => "nearest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOptions {
    pub block: ScrollAlign,
    pub inline: ScrollAlign,
    pub smooth: bool,
}

impl ScrollOptions {
    pub fn center() -> Self {
        Self::default()
    }

    pub fn nearest() -> Self {
        Self {
            block: ScrollAlign::Nearest,
            inline: ScrollAlign::Nearest,
            smooth: false,
        }
    }

    /// Options object literal passed to `Element.scrollIntoView`
    pub fn to_js(self) -> String {
        format!(
            "{{ block: '{}', inline: '{}', behavior: '{}' }}",
            self.block.as_str(),
            self.inline.as_str(),
            if self.smooth { "smooth" } else { "auto" }
        )
    }
}

/// Handle to one element of the live state
///
/// Handles are only valid until the next reveal step; callers re-fetch
/// instead of holding on to them.
#[async_trait]
pub trait ItemHandle: Send + Sync {
    async fn text(&self) -> WaitResult<String>;

    async fn attribute(&self, name: &str) -> WaitResult<Option<String>>;

    /// Perform the element's primary action (a click)
    async fn act(&self) -> WaitResult<()>;

    async fn is_visible(&self) -> WaitResult<bool>;

    /// Not disabled (form controls without `disabled` are enabled)
    async fn is_enabled(&self) -> WaitResult<bool>;

    /// Bounding box lies fully within the viewport
    async fn is_in_viewport(&self) -> WaitResult<bool>;

    async fn scroll_into_view(&self, options: ScrollOptions) -> WaitResult<()>;

    /// Scroll the element's own content, e.g. a grid body viewport
    async fn scroll_by(&self, dx: f64, dy: f64) -> WaitResult<()>;
}

/// Query interface over the live state
#[async_trait]
pub trait LiveStateSource: Send + Sync {
    type Handle: ItemHandle + Clone + 'static;

    /// First element matching `query`, `None` when absent
    async fn fetch_one(&self, query: &str) -> WaitResult<Option<Self::Handle>>;

    /// All elements matching `query` in document order
    async fn fetch_many(&self, query: &str) -> WaitResult<Vec<Self::Handle>>;

    /// PNG capture of the current state, when the source supports it
    async fn screenshot(&self) -> WaitResult<Option<Vec<u8>>> {
        Ok(None)
    }
}
