//! Column/header index resolution
//!
//! Two failure modes are kept apart: a header row that never populates is a
//! `Timeout` from the wait, while a populated row without the label is a
//! terminal `NotFound`.

use std::future::Future;

use tracing::debug;

use super::clock::{Clock, TokioClock};
use super::poller::poll_with;
use super::policy::WaitPolicy;
use crate::utils::{WaitError, WaitResult};

pub async fn resolve_index<L, F>(header_lookup: L, target_label: &str, policy: &WaitPolicy) -> WaitResult<usize>
where
    L: FnMut() -> F,
    F: Future<Output = WaitResult<Vec<String>>>,
{
    resolve_index_with(&TokioClock, header_lookup, target_label, policy).await
}

/// Wait for a non-empty header snapshot, then return the 1-based position of
/// the first label equal to `target_label` (both sides trimmed).
pub async fn resolve_index_with<L, F>(
    clock: &dyn Clock,
    mut header_lookup: L,
    target_label: &str,
    policy: &WaitPolicy,
) -> WaitResult<usize>
where
    L: FnMut() -> F,
    F: Future<Output = WaitResult<Vec<String>>>,
{
    poll_with(
        clock,
        || {
            let lookup = header_lookup();
            async move { lookup.await.map(|headers| !headers.is_empty()) }
        },
        policy,
    )
    .await?;

    let headers = header_lookup().await?;
    let target = target_label.trim();

    match position_of(&headers, target) {
        Some(index) => {
            debug!(target, index, "Resolved header index");
            Ok(index)
        }
        None => {
            debug!(target, headers = ?headers, "Header label not present");
            Err(WaitError::not_found(format!("column '{target}'")))
        }
    }
}

/// 1-based position of the first label equal to `target` after trimming
pub fn position_of(labels: &[String], target: &str) -> Option<usize> {
    labels
        .iter()
        .position(|label| label.trim() == target)
        .map(|index| index + 1)
}
