//! Locate-and-act retry loop
//!
//! Searches a live, possibly virtualised collection for the first item that
//! satisfies a predicate, acts on it once, and reveals more of the collection
//! between attempts. Each attempt works on a freshly fetched snapshot; handles
//! from an earlier attempt are dropped before the next fetch because a reveal
//! step may have re-rendered them.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::clock::{Clock, TokioClock};
use super::poller::Evaluation;
use super::policy::{ConditionMode, RetrySearchPolicy};
use crate::utils::{WaitError, WaitResult};

/// Outcome of a locate-and-act search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome<T> {
    /// `item` matched in the snapshot of `attempt` (0-based) and was acted on
    Found { item: T, attempt: u32 },
    /// Every attempt was scanned without a match
    NotFound { attempts: u32 },
    Cancelled,
}

impl<T> SearchOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }

    pub fn item(&self) -> Option<&T> {
        match self {
            SearchOutcome::Found { item, .. } => Some(item),
            _ => None,
        }
    }

    pub fn into_item(self) -> Option<T> {
        match self {
            SearchOutcome::Found { item, .. } => Some(item),
            _ => None,
        }
    }

    /// Turn a miss into an error for callers that must have a match
    pub fn found_or(self, target: impl Into<String>) -> WaitResult<T> {
        match self {
            SearchOutcome::Found { item, .. } => Ok(item),
            SearchOutcome::NotFound { .. } => Err(WaitError::not_found(target)),
            SearchOutcome::Cancelled => Err(WaitError::Cancelled),
        }
    }
}

/// Run the search with the tokio clock and no cancellation
pub async fn locate_and_act<T, Fetch, FetchFut, Pred, PredFut, P, Act, ActFut, Reveal, RevealFut>(
    fetch_items: Fetch,
    predicate: Pred,
    action: Act,
    reveal_more: Reveal,
    policy: &RetrySearchPolicy,
) -> WaitResult<SearchOutcome<T>>
where
    T: Clone,
    Fetch: FnMut() -> FetchFut,
    FetchFut: Future<Output = WaitResult<Vec<T>>>,
    Pred: FnMut(T) -> PredFut,
    PredFut: Future<Output = P>,
    P: Evaluation<()>,
    Act: FnOnce(T) -> ActFut,
    ActFut: Future<Output = WaitResult<()>>,
    Reveal: FnMut() -> RevealFut,
    RevealFut: Future<Output = WaitResult<()>>,
{
    locate_and_act_with(
        &TokioClock,
        fetch_items,
        predicate,
        action,
        reveal_more,
        policy,
        None,
    )
    .await
}

/// Full form of the search
///
/// * `fetch_items` is called once per attempt; a failure ends the search
///   immediately.
/// * `predicate` is awaited for each item in snapshot order; scanning stops
///   at the first match. Predicate failures follow `policy.mode`.
/// * `action` runs exactly once, on the first match. Its failure is an
///   `Action` error.
/// * `reveal_more` runs after every attempt without a match, followed by
///   `policy.settle_delay`. Its failure is a `Fetch` error.
/// * `cancel`, when given, is checked before each attempt and raced against
///   the settle delay.
#[allow(clippy::too_many_arguments)]
pub async fn locate_and_act_with<T, Fetch, FetchFut, Pred, PredFut, P, Act, ActFut, Reveal, RevealFut>(
    clock: &dyn Clock,
    mut fetch_items: Fetch,
    mut predicate: Pred,
    action: Act,
    mut reveal_more: Reveal,
    policy: &RetrySearchPolicy,
    cancel: Option<&CancellationToken>,
) -> WaitResult<SearchOutcome<T>>
where
    T: Clone,
    Fetch: FnMut() -> FetchFut,
    FetchFut: Future<Output = WaitResult<Vec<T>>>,
    Pred: FnMut(T) -> PredFut,
    PredFut: Future<Output = P>,
    P: Evaluation<()>,
    Act: FnOnce(T) -> ActFut,
    ActFut: Future<Output = WaitResult<()>>,
    Reveal: FnMut() -> RevealFut,
    RevealFut: Future<Output = WaitResult<()>>,
{
    policy.validate()?;

    for attempt in 0..policy.max_attempts {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            info!(attempt, "Search cancelled before attempt");
            return Ok(SearchOutcome::Cancelled);
        }

        let snapshot = fetch_items().await?;
        debug!(attempt, items = snapshot.len(), "Scanning snapshot");

        if let Some(item) = first_match(&snapshot, &mut predicate, policy.mode).await? {
            action(item.clone()).await.map_err(as_action_error)?;
            info!(attempt, "Match found and acted on");
            return Ok(SearchOutcome::Found { item, attempt });
        }
        drop(snapshot);

        debug!(attempt, "No match in snapshot, revealing more");
        reveal_more().await.map_err(as_fetch_error)?;

        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!(attempt, "Search cancelled while settling");
                        return Ok(SearchOutcome::Cancelled);
                    }
                    _ = clock.sleep(policy.settle_delay) => {}
                }
            }
            None => clock.sleep(policy.settle_delay).await,
        }
    }

    info!(attempts = policy.max_attempts, "No match after maximum attempts");
    Ok(SearchOutcome::NotFound {
        attempts: policy.max_attempts,
    })
}

fn as_action_error(err: WaitError) -> WaitError {
    match err {
        WaitError::Action(_) => err,
        other => WaitError::Action(other.to_string()),
    }
}

/// A failed reveal means the live source itself is unusable
fn as_fetch_error(err: WaitError) -> WaitError {
    match err {
        WaitError::Fetch(_) => err,
        other => WaitError::Fetch(other.to_string()),
    }
}

async fn first_match<T, Pred, PredFut, P>(
    snapshot: &[T],
    predicate: &mut Pred,
    mode: ConditionMode,
) -> WaitResult<Option<T>>
where
    T: Clone,
    Pred: FnMut(T) -> PredFut,
    PredFut: Future<Output = P>,
    P: Evaluation<()>,
{
    for (index, item) in snapshot.iter().enumerate() {
        match predicate(item.clone()).await.into_evaluation() {
            Ok(Some(())) => return Ok(Some(item.clone())),
            Ok(None) => {}
            Err(reason) => match mode {
                ConditionMode::Strict => return Err(WaitError::Condition(reason)),
                ConditionMode::Forgiving => {
                    debug!(index, %reason, "Predicate failed, treating item as non-matching");
                }
            },
        }
    }
    Ok(None)
}
