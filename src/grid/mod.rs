//! Data grid helpers built on the wait engine
//!
//! Grids virtualise both rows and columns: only what is near the viewport
//! exists in the DOM. Every helper here therefore searches through
//! `locate_and_act`, scrolling to reveal more between fresh snapshots.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::live::{ItemHandle, LiveStateSource, ScrollOptions};
use crate::report::StepOutcome;
use crate::utils::{WaitError, WaitResult, wait_for_elements};
use crate::wait::{RetrySearchPolicy, SearchOutcome, WaitEngine, WaitPolicy};

/// CSS selectors describing the grid markup (AG-Grid by default)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSelectors {
    #[serde(default = "default_rows")]
    pub rows: String,

    #[serde(default = "default_first_row")]
    pub first_row: String,

    #[serde(default = "default_cell")]
    pub cell: String,

    /// Header cells carrying the `col-id` attribute
    #[serde(default = "default_header_cells")]
    pub header_cells: String,

    /// Label elements inside header cells
    #[serde(default = "default_header_text")]
    pub header_text: String,

    /// Scrollable container holding the rows
    #[serde(default = "default_body_viewport")]
    pub body_viewport: String,
}

fn default_rows() -> String {
    ".ag-center-cols-container .ag-row".to_string()
}
fn default_first_row() -> String {
    ".ag-center-cols-container .ag-row-first".to_string()
}
fn default_cell() -> String {
    ".ag-cell".to_string()
}
fn default_header_cells() -> String {
    ".ag-header-cell".to_string()
}
fn default_header_text() -> String {
    ".ag-header-cell-text".to_string()
}
fn default_body_viewport() -> String {
    ".ag-body-viewport".to_string()
}

impl Default for GridSelectors {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            first_row: default_first_row(),
            cell: default_cell(),
            header_cells: default_header_cells(),
            header_text: default_header_text(),
            body_viewport: default_body_viewport(),
        }
    }
}

impl GridSelectors {
    /// Cells of one column across all rendered rows, in row order
    pub fn column_cells(&self, col_id: &str) -> String {
        format!(
            "{} {}[col-id=\"{}\"]",
            self.rows,
            self.cell,
            col_id.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }

    pub fn first_row_cells(&self) -> String {
        format!("{} {}", self.first_row, self.cell)
    }
}

/// Grid helpers over one live source
pub struct Grid<'a, S: LiveStateSource> {
    engine: &'a WaitEngine,
    source: &'a S,
    selectors: &'a GridSelectors,
}

impl<'a, S: LiveStateSource> Grid<'a, S> {
    pub fn new(engine: &'a WaitEngine, source: &'a S, selectors: &'a GridSelectors) -> Self {
        Self {
            engine,
            source,
            selectors,
        }
    }

    /// Current header labels in column order
    pub async fn header_labels(&self) -> WaitResult<Vec<String>> {
        let headers = self.source.fetch_many(&self.selectors.header_text).await?;
        let mut labels = Vec::with_capacity(headers.len());
        for header in &headers {
            labels.push(header.text().await?);
        }
        Ok(labels)
    }

    /// Visible header label → `col-id`, in column order
    ///
    /// Headers without a `col-id`, hidden headers and empty labels are skipped.
    pub async fn column_mapping(&self) -> WaitResult<Vec<(String, String)>> {
        let headers = self.source.fetch_many(&self.selectors.header_cells).await?;
        let mut mapping = Vec::new();

        for header in &headers {
            let Some(col_id) = header.attribute("col-id").await? else {
                continue;
            };
            if !header.is_visible().await? {
                continue;
            }
            let label = header.text().await?.trim().to_string();
            if !label.is_empty() {
                mapping.push((label, col_id));
            }
        }

        debug!(columns = mapping.len(), "Built column mapping");
        Ok(mapping)
    }

    pub async fn column_id(&self, label: &str) -> WaitResult<Option<String>> {
        let label = label.trim();
        Ok(self
            .column_mapping()
            .await?
            .into_iter()
            .find_map(|(name, id)| (name == label).then_some(id)))
    }

    /// 1-based index of the column labelled `label`
    pub async fn find_column_index(&self, label: &str, policy: &WaitPolicy) -> WaitResult<usize> {
        let description = format!("Find column '{}'", label.trim());
        let result = self
            .engine
            .report_step(
                &description,
                self.engine
                    .resolve_index(|| self.header_labels(), label, policy),
            )
            .await;

        if result.is_err() {
            self.engine.attach_screenshot(self.source, &description).await;
        }
        result
    }

    /// Find the first row whose `column` cell contains `needle` and click it
    ///
    /// Scrolls the body viewport by `policy.reveal_step` pixels between
    /// attempts. An unknown column is `NotFound`; a row that never shows up is
    /// `Ok(SearchOutcome::NotFound)`.
    pub async fn search_record_click(
        &self,
        column: &str,
        needle: &str,
        policy: &RetrySearchPolicy,
    ) -> WaitResult<SearchOutcome<S::Handle>> {
        let description = format!("Search '{needle}' in column '{column}'");
        let outcome = self
            .engine
            .report_step_with(&description, self.search_record_click_inner(column, needle, policy), classify_search)
            .await;

        if !matches!(outcome, Ok(SearchOutcome::Found { .. })) {
            self.engine.attach_screenshot(self.source, &description).await;
        }
        outcome
    }

    async fn search_record_click_inner(
        &self,
        column: &str,
        needle: &str,
        policy: &RetrySearchPolicy,
    ) -> WaitResult<SearchOutcome<S::Handle>> {
        let col_id = self
            .column_id(column)
            .await?
            .ok_or_else(|| WaitError::not_found(format!("column '{}'", column.trim())))?;
        let cells_query = self.selectors.column_cells(&col_id);
        let step = policy.reveal_step;

        let outcome = self
            .engine
            .locate_and_act(
                || self.source.fetch_many(&cells_query),
                |cell: S::Handle| async move { cell.text().await.map(|text| text.trim().contains(needle)) },
                |cell: S::Handle| async move {
                    cell.scroll_into_view(ScrollOptions::nearest()).await?;
                    cell.act().await
                },
                || self.scroll_viewport(step),
                policy,
            )
            .await?;

        if let SearchOutcome::Found { attempt, .. } = &outcome {
            info!(column, needle, attempt, "Record found and clicked");
        }
        Ok(outcome)
    }

    /// Bring the header labelled `label` (case-insensitive) into view
    ///
    /// Between attempts the last rendered header is scrolled into view, which
    /// makes the grid render the next columns.
    pub async fn scroll_to_column(&self, label: &str, policy: &RetrySearchPolicy) -> WaitResult<SearchOutcome<S::Handle>> {
        let target = label.trim().to_lowercase();
        let target = target.as_str();
        let description = format!("Scroll to column '{}'", label.trim());

        self.engine
            .report_step_with(
                &description,
                self.engine.locate_and_act(
                    || self.source.fetch_many(&self.selectors.header_text),
                    |header: S::Handle| async move {
                        header
                            .text()
                            .await
                            .map(|text| text.trim().to_lowercase() == target)
                    },
                    |header: S::Handle| async move { header.scroll_into_view(ScrollOptions::center()).await },
                    || self.reveal_next_columns(),
                    policy,
                ),
                classify_search,
            )
            .await
    }

    /// Wait until the grid has rendered at least one row
    pub async fn wait_for_rows(&self, policy: &WaitPolicy) -> WaitResult<Vec<S::Handle>> {
        wait_for_elements(self.engine, self.source, &self.selectors.rows, policy).await
    }

    /// Cell texts of the first row keyed `column1..columnN`
    pub async fn first_row_values(&self) -> WaitResult<Vec<(String, String)>> {
        let cells = self.source.fetch_many(&self.selectors.first_row_cells()).await?;
        let mut values = Vec::with_capacity(cells.len());
        for (index, cell) in cells.iter().enumerate() {
            values.push((format!("column{}", index + 1), cell.text().await?));
        }
        Ok(values)
    }

    /// `find_column_index` under the engine's default wait policy
    pub async fn column_index(&self, label: &str) -> WaitResult<usize> {
        self.find_column_index(label, self.engine.wait_policy()).await
    }

    /// `search_record_click` under the engine's default search policy
    pub async fn click_record(&self, column: &str, needle: &str) -> WaitResult<SearchOutcome<S::Handle>> {
        self.search_record_click(column, needle, self.engine.search_policy()).await
    }

    pub async fn scroll_to(&self, label: &str) -> WaitResult<SearchOutcome<S::Handle>> {
        self.scroll_to_column(label, self.engine.search_policy()).await
    }

    pub async fn rows(&self) -> WaitResult<Vec<S::Handle>> {
        self.wait_for_rows(self.engine.wait_policy()).await
    }

    async fn scroll_viewport(&self, dy: f64) -> WaitResult<()> {
        match self.source.fetch_one(&self.selectors.body_viewport).await? {
            Some(viewport) => viewport.scroll_by(0.0, dy).await,
            None => {
                debug!(selector = %self.selectors.body_viewport, "No scroll container, nothing to reveal");
                Ok(())
            }
        }
    }

    async fn reveal_next_columns(&self) -> WaitResult<()> {
        let headers = self.source.fetch_many(&self.selectors.header_text).await?;
        match headers.last() {
            Some(last) => last.scroll_into_view(ScrollOptions::center()).await,
            None => Ok(()),
        }
    }
}

fn classify_search<T>(result: &WaitResult<SearchOutcome<T>>) -> StepOutcome {
    match result {
        Ok(SearchOutcome::Found { .. }) => StepOutcome::Passed,
        Ok(_) => StepOutcome::Failed,
        Err(_) => StepOutcome::Broken,
    }
}
