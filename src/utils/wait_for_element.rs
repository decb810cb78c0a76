//! Element polling utilities for SPA support
//!
//! Single Page Applications render elements via JavaScript after the load
//! event fires, so every lookup goes through the poller. Each evaluation
//! re-queries the source; the handle returned is the one that satisfied the
//! final evaluation.

use tracing::debug;

use crate::live::{ItemHandle, LiveStateSource};
use crate::utils::{WaitError, WaitResult};
use crate::wait::{WaitEngine, WaitPolicy};

/// Wait for an element matching `query` to exist
///
/// # Returns
/// * `Ok(handle)` - The element was found
/// * `Err(WaitError::Timeout)` - Deadline passed first
pub async fn wait_for_element<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    policy: &WaitPolicy,
) -> WaitResult<S::Handle> {
    debug!(query, "Waiting for element");
    engine
        .poll_value(|| source.fetch_one(query), &with_default_message(policy, query, "to exist"))
        .await
}

/// Wait for at least one element matching `query`
pub async fn wait_for_elements<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    policy: &WaitPolicy,
) -> WaitResult<Vec<S::Handle>> {
    engine
        .poll_value(
            || async move {
                source
                    .fetch_many(query)
                    .await
                    .map(|items| (!items.is_empty()).then_some(items))
            },
            &with_default_message(policy, query, "to have at least one match"),
        )
        .await
}

/// Wait for the collection to have more than `index` members and return the
/// member at `index`
pub async fn wait_for_element_at<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    index: usize,
    policy: &WaitPolicy,
) -> WaitResult<S::Handle> {
    engine
        .poll_value(
            || async move {
                source
                    .fetch_many(query)
                    .await
                    .map(|mut items| (items.len() > index).then(|| items.swap_remove(index)))
            },
            &with_default_message(policy, query, &format!("to have more than {index} matches")),
        )
        .await
}

/// Wait for an element to exist and be visible
pub async fn wait_for_visible<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    policy: &WaitPolicy,
) -> WaitResult<S::Handle> {
    engine
        .poll_value(
            || async move {
                let Some(handle) = source.fetch_one(query).await? else {
                    return Ok(None);
                };
                let visible = handle.is_visible().await?;
                Ok::<_, WaitError>(visible.then_some(handle))
            },
            &with_default_message(policy, query, "to be visible"),
        )
        .await
}

/// Wait until an element matching `query` exists, is visible and is enabled
pub async fn wait_for_enabled<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    policy: &WaitPolicy,
) -> WaitResult<S::Handle> {
    engine
        .poll_value(
            || async move {
                let Some(handle) = source.fetch_one(query).await? else {
                    return Ok(None);
                };
                let ready = handle.is_visible().await? && handle.is_enabled().await?;
                Ok::<_, WaitError>(ready.then_some(handle))
            },
            &with_default_message(policy, query, "to be enabled"),
        )
        .await
}

/// Wait until nothing matches `query`
pub async fn wait_for_absent<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    policy: &WaitPolicy,
) -> WaitResult<()> {
    debug!(query, "Waiting for element to disappear");
    engine
        .poll(
            || async move { source.fetch_one(query).await.map(|found| found.is_none()) },
            &with_default_message(policy, query, "to be gone"),
        )
        .await
}

/// Wait until `query` matches nothing or only a hidden element
///
/// Loading indicators are often kept in the DOM and merely hidden.
pub async fn wait_for_hidden<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    policy: &WaitPolicy,
) -> WaitResult<()> {
    engine
        .poll(
            || async move {
                match source.fetch_one(query).await? {
                    Some(handle) => handle.is_visible().await.map(|visible| !visible),
                    None => Ok(true),
                }
            },
            &with_default_message(policy, query, "to be hidden"),
        )
        .await
}

/// Whether `query` exists (or, with `expect_absent`, is gone) within the
/// policy's timeout
///
/// A timeout is `Ok(false)`; other failures are still errors.
pub async fn exists_within<S: LiveStateSource>(
    engine: &WaitEngine,
    source: &S,
    query: &str,
    expect_absent: bool,
    policy: &WaitPolicy,
) -> WaitResult<bool> {
    let result = if expect_absent {
        wait_for_absent(engine, source, query, policy).await
    } else {
        wait_for_element(engine, source, query, policy).await.map(drop)
    };

    match result {
        Ok(()) => Ok(true),
        Err(WaitError::Timeout { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

fn with_default_message(policy: &WaitPolicy, query: &str, expectation: &str) -> WaitPolicy {
    let mut policy = policy.clone();
    if policy.on_timeout_message.is_none() {
        policy.on_timeout_message = Some(format!(
            "expected '{}' {} within {}ms",
            query,
            expectation,
            policy.timeout.as_millis()
        ));
    }
    policy
}
