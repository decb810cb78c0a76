//! In-memory live state source for integration tests
//!
//! Every selector is scripted with a list of snapshots. Which snapshot a
//! fetch sees depends on the script kind: `Sequence` advances on every fetch,
//! `Paged` follows the scroll position, which every scroll call advances.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use kodegen_tools_wait::{ItemHandle, LiveStateSource, ScrollOptions, WaitError, WaitResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Clicked(String),
    ScrolledIntoView(String),
    ScrolledBy(f64, f64),
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, Script>,
    fetches: HashMap<String, usize>,
    scroll_position: usize,
    interactions: Vec<Interaction>,
    screenshot: Option<Vec<u8>>,
}

enum Script {
    Sequence(Vec<Vec<FakeHandle>>),
    Paged(Vec<Vec<FakeHandle>>),
    Failing(String),
}

#[derive(Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<State>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch N sees snapshot N; the last snapshot repeats
    pub fn script(&self, query: &str, snapshots: Vec<Vec<FakeHandle>>) -> &Self {
        self.set(query, Script::Sequence(snapshots))
    }

    /// Always the same snapshot
    pub fn fixed(&self, query: &str, items: Vec<FakeHandle>) -> &Self {
        self.set(query, Script::Sequence(vec![items]))
    }

    /// Snapshot chosen by the current scroll position; the last page repeats
    pub fn paged(&self, query: &str, pages: Vec<Vec<FakeHandle>>) -> &Self {
        self.set(query, Script::Paged(pages))
    }

    pub fn failing(&self, query: &str, reason: &str) -> &Self {
        self.set(query, Script::Failing(reason.to_string()))
    }

    pub fn with_screenshot(&self, png: Vec<u8>) -> &Self {
        self.state.lock().screenshot = Some(png);
        self
    }

    pub fn handle(&self, text: &str) -> FakeHandle {
        FakeHandle {
            text: text.to_string(),
            attributes: Vec::new(),
            visible: true,
            enabled: true,
            in_viewport: true,
            state: self.state.clone(),
        }
    }

    pub fn fetch_count(&self, query: &str) -> usize {
        self.state.lock().fetches.get(query).copied().unwrap_or(0)
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.state.lock().interactions.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.interactions()
            .into_iter()
            .filter_map(|i| match i {
                Interaction::Clicked(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn scroll_position(&self) -> usize {
        self.state.lock().scroll_position
    }

    fn set(&self, query: &str, script: Script) -> &Self {
        self.state.lock().scripts.insert(query.to_string(), script);
        self
    }
}

#[async_trait]
impl LiveStateSource for FakeSource {
    type Handle = FakeHandle;

    async fn fetch_one(&self, query: &str) -> WaitResult<Option<FakeHandle>> {
        Ok(self.fetch_many(query).await?.into_iter().next())
    }

    async fn fetch_many(&self, query: &str) -> WaitResult<Vec<FakeHandle>> {
        let mut state = self.state.lock();
        let count = {
            let entry = state.fetches.entry(query.to_string()).or_insert(0);
            *entry += 1;
            *entry - 1
        };
        let position = state.scroll_position;

        match state.scripts.get(query) {
            None => Ok(Vec::new()),
            Some(Script::Failing(reason)) => Err(WaitError::Fetch(reason.clone())),
            Some(Script::Sequence(snapshots)) => Ok(pick(snapshots, count)),
            Some(Script::Paged(pages)) => Ok(pick(pages, position)),
        }
    }

    async fn screenshot(&self) -> WaitResult<Option<Vec<u8>>> {
        Ok(self.state.lock().screenshot.clone())
    }
}

fn pick(snapshots: &[Vec<FakeHandle>], index: usize) -> Vec<FakeHandle> {
    match snapshots.len() {
        0 => Vec::new(),
        len => snapshots[index.min(len - 1)].clone(),
    }
}

#[derive(Clone)]
pub struct FakeHandle {
    text: String,
    attributes: Vec<(String, String)>,
    visible: bool,
    enabled: bool,
    in_viewport: bool,
    state: Arc<Mutex<State>>,
}

impl fmt::Debug for FakeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeHandle")
            .field("text", &self.text)
            .field("attributes", &self.attributes)
            .field("visible", &self.visible)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl FakeHandle {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn offscreen(mut self) -> Self {
        self.in_viewport = false;
        self
    }

    pub fn label(&self) -> &str {
        &self.text
    }
}

#[async_trait]
impl ItemHandle for FakeHandle {
    async fn text(&self) -> WaitResult<String> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> WaitResult<Option<String>> {
        Ok(self
            .attributes
            .iter()
            .find_map(|(key, value)| (key == name).then(|| value.clone())))
    }

    async fn act(&self) -> WaitResult<()> {
        self.state.lock().interactions.push(Interaction::Clicked(self.text.clone()));
        Ok(())
    }

    async fn is_visible(&self) -> WaitResult<bool> {
        Ok(self.visible)
    }

    async fn is_enabled(&self) -> WaitResult<bool> {
        Ok(self.enabled)
    }

    async fn is_in_viewport(&self) -> WaitResult<bool> {
        Ok(self.in_viewport)
    }

    /// Also advances paged scripts, the way a grid renders the next columns
    async fn scroll_into_view(&self, _options: ScrollOptions) -> WaitResult<()> {
        let mut state = self.state.lock();
        state.scroll_position += 1;
        state.interactions.push(Interaction::ScrolledIntoView(self.text.clone()));
        Ok(())
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> WaitResult<()> {
        let mut state = self.state.lock();
        state.scroll_position += 1;
        state.interactions.push(Interaction::ScrolledBy(dx, dy));
        Ok(())
    }
}
