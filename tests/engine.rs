use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use kodegen_tools_wait::grid::{Grid, GridSelectors};
use kodegen_tools_wait::report::{MemoryReporter, ReportEvent};
use kodegen_tools_wait::wait::{SearchOutcome, WaitEngine};
use kodegen_tools_wait::{ConditionMode, WaitError, load_yaml_config, scroll_to_element};

mod common;
use common::{FakeSource, Interaction};

fn engine_from_yaml(yaml: &str) -> WaitEngine {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{yaml}").unwrap();
    let config = load_yaml_config(file.path()).unwrap();
    WaitEngine::from_config(&config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn configured_wait_policy_drives_until() {
    let engine = engine_from_yaml("wait:\n  timeout_ms: 300\n  interval_ms: 100\n");
    assert_eq!(engine.wait_policy().timeout, Duration::from_millis(300));
    let start = Instant::now();

    let err = engine.until(|| async { false }).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn configured_strict_mode_surfaces_condition_errors() {
    let engine = engine_from_yaml("wait:\n  strict: true\n");
    assert_eq!(engine.wait_policy().mode, ConditionMode::Strict);

    let err = engine
        .until(|| async { Err::<bool, _>("stale element") })
        .await
        .unwrap_err();

    assert_eq!(err, WaitError::Condition("stale element".to_string()));
}

#[tokio::test(start_paused = true)]
async fn configured_search_policy_drives_locate() {
    let engine = engine_from_yaml("search:\n  max_attempts: 2\n  settle_delay_ms: 250\n");
    let start = Instant::now();

    let outcome = engine
        .locate(
            || async { Ok(vec!["a", "b"]) },
            |item: &'static str| async move { item == "z" },
            |_| async { Ok(()) },
            || async { Ok(()) },
        )
        .await
        .unwrap();

    assert_eq!(outcome, SearchOutcome::NotFound { attempts: 2 });
    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn invalid_configured_policy_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "search:\n  max_attempts: 0\n").unwrap();
    let config = load_yaml_config(file.path()).unwrap();

    let err = WaitEngine::from_config(&config).unwrap_err();
    assert!(matches!(err, WaitError::InvalidPolicy(_)));
}

#[tokio::test(start_paused = true)]
async fn grid_shortcuts_use_configured_policies() {
    let engine = engine_from_yaml("search:\n  max_attempts: 3\n  reveal_step_px: 150\n  settle_delay_ms: 100\n");
    let selectors = GridSelectors::default();
    let source = FakeSource::new();
    source
        .fixed(
            &selectors.header_cells,
            vec![source.handle("Status").attr("col-id", "status")],
        )
        .fixed(&selectors.header_text, vec![source.handle("Status")])
        .fixed(&selectors.body_viewport, vec![source.handle("viewport")])
        .paged(&selectors.column_cells("status"), vec![vec![source.handle("Open")]]);
    let grid = Grid::new(&engine, &source, &selectors);

    assert_eq!(grid.column_index("Status").await.unwrap(), 1);

    let outcome = grid.click_record("Status", "Closed").await.unwrap();
    assert!(matches!(outcome, SearchOutcome::NotFound { attempts: 3 }));
    assert_eq!(source.fetch_count(&selectors.column_cells("status")), 3);
    assert_eq!(
        source.interactions(),
        vec![Interaction::ScrolledBy(0.0, 150.0); 3]
    );
}

#[tokio::test(start_paused = true)]
async fn scroll_to_element_skips_elements_already_in_view() {
    let source = FakeSource::new();
    let engine = WaitEngine::default();
    let button = source.handle("Save");
    let start = Instant::now();

    assert!(!scroll_to_element(&engine, &source, &button, false).await);

    assert!(source.interactions().is_empty());
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn scroll_to_element_reports_the_scroll() {
    let source = FakeSource::new();
    source.with_screenshot(vec![0x89, b'P', b'N', b'G']);
    let reporter = Arc::new(MemoryReporter::new());
    let engine = engine_from_yaml("search:\n  settle_delay_ms: 200\n").with_reporter(reporter.clone());
    let row = source.handle("Order 42").offscreen();
    let start = Instant::now();

    assert!(scroll_to_element(&engine, &source, &row, true).await);

    assert_eq!(
        source.interactions(),
        vec![Interaction::ScrolledIntoView("Order 42".to_string())]
    );
    assert_eq!(start.elapsed(), Duration::from_millis(200));

    let events = reporter.events();
    assert_eq!(
        events.first(),
        Some(&ReportEvent::StepStarted {
            description: "Scrolled to Order 42".to_string()
        })
    );
    assert!(events.iter().any(|event| matches!(
        event,
        ReportEvent::Attached { name, .. } if name.starts_with("Scrolled_to_Order_42_")
    )));
}

#[tokio::test(start_paused = true)]
async fn scroll_to_element_labels_textless_elements_by_class() {
    let source = FakeSource::new();
    let reporter = Arc::new(MemoryReporter::new());
    let engine = WaitEngine::default().with_reporter(reporter.clone());
    let icon = source.handle("  ").attr("class", "icon  icon-edit").offscreen();

    assert!(scroll_to_element(&engine, &source, &icon, false).await);

    assert_eq!(
        reporter.events().first(),
        Some(&ReportEvent::StepStarted {
            description: "Scrolled to element_icon_icon-edit".to_string()
        })
    );
}
