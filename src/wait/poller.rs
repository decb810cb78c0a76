//! Condition poller
//!
//! Evaluates a condition immediately, then once per `interval`, until it
//! holds or the deadline passes. The final evaluation never starts after the
//! deadline: when the next interval would overshoot, the poller sleeps out the
//! remaining time and reports a timeout. Each evaluation is also raced
//! against the deadline, so a slow or hung condition is abandoned once the
//! timeout elapses.

use std::fmt::Display;
use std::future::Future;

use tracing::debug;

use super::clock::{Clock, TokioClock};
use super::policy::{ConditionMode, WaitPolicy};
use crate::utils::{WaitError, WaitResult};

/// Result of one condition evaluation
///
/// `Ok(Some(v))` means the condition held and produced `v`, `Ok(None)` means
/// not yet, and `Err` carries the reason the evaluation itself failed.
pub trait Evaluation<T> {
    fn into_evaluation(self) -> Result<Option<T>, String>;
}

impl Evaluation<()> for bool {
    fn into_evaluation(self) -> Result<Option<()>, String> {
        Ok(self.then_some(()))
    }
}

impl<E: Display> Evaluation<()> for Result<bool, E> {
    fn into_evaluation(self) -> Result<Option<()>, String> {
        self.map(|held| held.then_some(())).map_err(|e| e.to_string())
    }
}

impl<T> Evaluation<T> for Option<T> {
    fn into_evaluation(self) -> Result<Option<T>, String> {
        Ok(self)
    }
}

impl<T, E: Display> Evaluation<T> for Result<Option<T>, E> {
    fn into_evaluation(self) -> Result<Option<T>, String> {
        self.map_err(|e| e.to_string())
    }
}

/// Wait until `condition` holds, using the tokio clock
pub async fn poll<C, F, O>(condition: C, policy: &WaitPolicy) -> WaitResult<()>
where
    C: FnMut() -> F,
    F: Future<Output = O>,
    O: Evaluation<()>,
{
    poll_value_with(&TokioClock, condition, policy).await
}

/// Wait until `condition` holds, using the given clock
pub async fn poll_with<C, F, O>(clock: &dyn Clock, condition: C, policy: &WaitPolicy) -> WaitResult<()>
where
    C: FnMut() -> F,
    F: Future<Output = O>,
    O: Evaluation<()>,
{
    poll_value_with(clock, condition, policy).await
}

/// Wait until `condition` yields a value and return it
///
/// This is what element waits build on: the condition fetches the element
/// and the poll hands back the very handle that satisfied it.
pub async fn poll_value_with<T, C, F, O>(
    clock: &dyn Clock,
    mut condition: C,
    policy: &WaitPolicy,
) -> WaitResult<T>
where
    C: FnMut() -> F,
    F: Future<Output = O>,
    O: Evaluation<T>,
{
    policy.validate()?;

    let start = clock.now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        // A hung evaluation must not hold the poll past its deadline
        let remaining = policy
            .timeout
            .saturating_sub(clock.now().saturating_duration_since(start));
        let outcome = tokio::select! {
            biased;
            outcome = condition() => outcome.into_evaluation(),
            _ = clock.sleep(remaining) => {
                debug!(attempts, "Condition evaluation overran the deadline");
                return Err(timed_out(clock, start, policy, attempts));
            }
        };

        match outcome {
            Ok(Some(value)) => {
                debug!(
                    attempts,
                    elapsed_ms = clock.now().saturating_duration_since(start).as_millis() as u64,
                    "Condition satisfied"
                );
                return Ok(value);
            }
            Ok(None) => {}
            Err(reason) => match policy.mode {
                ConditionMode::Strict => {
                    debug!(attempts, %reason, "Condition failed in strict mode");
                    return Err(WaitError::Condition(reason));
                }
                ConditionMode::Forgiving => {
                    debug!(attempts, %reason, "Condition failed, treating as not yet true");
                }
            },
        }

        let elapsed = clock.now().saturating_duration_since(start);
        if elapsed >= policy.timeout {
            return Err(timed_out(clock, start, policy, attempts));
        }

        let remaining = policy.timeout - elapsed;
        if policy.interval > remaining {
            clock.sleep(remaining).await;
            return Err(timed_out(clock, start, policy, attempts));
        }

        clock.sleep(policy.interval).await;
    }
}

fn timed_out(
    clock: &dyn Clock,
    start: tokio::time::Instant,
    policy: &WaitPolicy,
    attempts: u32,
) -> WaitError {
    let elapsed = clock.now().saturating_duration_since(start);
    debug!(
        attempts,
        elapsed_ms = elapsed.as_millis() as u64,
        timeout_ms = policy.timeout.as_millis() as u64,
        "Condition timed out"
    );
    WaitError::timeout(elapsed, policy.on_timeout_message.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn succeeds_immediately_without_sleeping() {
        let start = tokio::time::Instant::now();
        poll(|| async { true }, &WaitPolicy::from_millis(1000, 100))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_longer_than_timeout_evaluates_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = poll(
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    false
                }
            },
            &WaitPolicy::from_millis(100, 500),
        )
        .await;

        assert!(matches!(result, Err(WaitError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_evaluates_once_and_times_out() {
        let result = poll(|| async { false }, &WaitPolicy::from_millis(0, 50)).await;
        match result {
            Err(WaitError::Timeout { elapsed, .. }) => assert_eq!(elapsed, Duration::ZERO),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_value_returns_the_produced_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = poll_value_with(
            &TokioClock,
            move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    (n >= 2).then(|| format!("ready after {n}"))
                }
            },
            &WaitPolicy::from_millis(1000, 100),
        )
        .await
        .unwrap();

        assert_eq!(value, "ready after 2");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_policy_is_reported_before_evaluating() {
        let result = poll(|| async { true }, &WaitPolicy::from_millis(1000, 0)).await;
        assert!(matches!(result, Err(WaitError::InvalidPolicy(_))));
    }
}
