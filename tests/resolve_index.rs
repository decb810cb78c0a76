use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use kodegen_tools_wait::wait::{ConditionMode, WaitPolicy, resolve_index};
use kodegen_tools_wait::{WaitError, WaitResult};

fn headers(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|label| label.to_string()).collect()
}

async fn fixed(labels: &[&str]) -> WaitResult<Vec<String>> {
    Ok(headers(labels))
}

#[tokio::test(start_paused = true)]
async fn resolves_one_based_position() {
    let policy = WaitPolicy::from_millis(1000, 100);

    let index = resolve_index(|| fixed(&["ID", "Name", "Status"]), "Status", &policy)
        .await
        .unwrap();
    assert_eq!(index, 3);

    let index = resolve_index(|| fixed(&["ID", "Name", "Status"]), "  ID ", &policy)
        .await
        .unwrap();
    assert_eq!(index, 1);
}

#[tokio::test(start_paused = true)]
async fn absent_label_is_not_found_without_waiting() {
    let start = Instant::now();

    let err = resolve_index(
        || fixed(&["ID", "Name", "Status"]),
        "Missing",
        &WaitPolicy::from_millis(1000, 100),
    )
    .await
    .unwrap_err();

    assert_eq!(err, WaitError::not_found("column 'Missing'"));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn repeated_resolution_is_stable() {
    let policy = WaitPolicy::from_millis(1000, 100);
    let first = resolve_index(|| fixed(&["ID", "Name", "Name"]), "Name", &policy).await;
    let second = resolve_index(|| fixed(&["ID", "Name", "Name"]), "Name", &policy).await;

    assert_eq!(first, Ok(2));
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn empty_header_row_times_out() {
    let start = Instant::now();

    let err = resolve_index(|| fixed(&[]), "Status", &WaitPolicy::from_millis(500, 100))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn waits_for_headers_to_render() {
    let lookups = &Mutex::new(0u32);

    let index = resolve_index(
        || async move {
            let mut count = lookups.lock();
            *count += 1;
            if *count < 3 {
                Ok(Vec::new())
            } else {
                Ok(headers(&["ID", "Status"]))
            }
        },
        "Status",
        &WaitPolicy::from_millis(1000, 100),
    )
    .await
    .unwrap();

    assert_eq!(index, 2);
    // Two empty snapshots, the populated one that ends the wait, then the
    // snapshot actually searched
    assert_eq!(*lookups.lock(), 4);
}

#[tokio::test(start_paused = true)]
async fn lookup_errors_during_wait_follow_mode() {
    let lookups = &Mutex::new(0u32);
    let flaky = || async move {
        let mut count = lookups.lock();
        *count += 1;
        if *count == 1 {
            Err(WaitError::Fetch("header row detached".to_string()))
        } else {
            Ok(headers(&["ID"]))
        }
    };

    let index = resolve_index(flaky, "ID", &WaitPolicy::from_millis(1000, 100))
        .await
        .unwrap();
    assert_eq!(index, 1);

    *lookups.lock() = 0;
    let err = resolve_index(
        flaky,
        "ID",
        &WaitPolicy::from_millis(1000, 100).with_mode(ConditionMode::Strict),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, WaitError::Condition(_)));
}
