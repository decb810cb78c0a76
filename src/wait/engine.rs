//! Wait engine context
//!
//! One `WaitEngine` is built at start-up and handed to every helper. It owns
//! the clock, the report sink, and the default policies; it holds no per-call
//! state, so concurrent waits through the same engine are independent.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::clock::{Clock, TokioClock};
use super::locate::{SearchOutcome, locate_and_act_with};
use super::poller::{Evaluation, poll_value_with};
use super::policy::{RetrySearchPolicy, WaitPolicy};
use super::resolve::resolve_index_with;
use crate::live::LiveStateSource;
use crate::report::{Reporter, StepOutcome, TracingReporter, sanitized_file_name};
use crate::utils::WaitResult;
use crate::utils::constants::PNG_MIME;

pub struct WaitEngine {
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn Reporter>,
    wait_policy: WaitPolicy,
    search_policy: RetrySearchPolicy,
}

impl WaitEngine {
    pub fn new(wait_policy: WaitPolicy, search_policy: RetrySearchPolicy) -> Self {
        Self {
            clock: Arc::new(TokioClock),
            reporter: Arc::new(TracingReporter),
            wait_policy,
            search_policy,
        }
    }

    /// Build from a loaded configuration, validating its policies
    pub fn from_config(config: &crate::Config) -> WaitResult<Self> {
        Ok(Self::new(config.wait.policy()?, config.search.policy()?))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn wait_policy(&self) -> &WaitPolicy {
        &self.wait_policy
    }

    pub fn search_policy(&self) -> &RetrySearchPolicy {
        &self.search_policy
    }

    pub async fn poll<C, F, O>(&self, condition: C, policy: &WaitPolicy) -> WaitResult<()>
    where
        C: FnMut() -> F,
        F: Future<Output = O>,
        O: Evaluation<()>,
    {
        poll_value_with(self.clock(), condition, policy).await
    }

    pub async fn poll_value<T, C, F, O>(&self, condition: C, policy: &WaitPolicy) -> WaitResult<T>
    where
        C: FnMut() -> F,
        F: Future<Output = O>,
        O: Evaluation<T>,
    {
        poll_value_with(self.clock(), condition, policy).await
    }

    /// Poll `condition` under the engine's default wait policy
    pub async fn until<C, F, O>(&self, condition: C) -> WaitResult<()>
    where
        C: FnMut() -> F,
        F: Future<Output = O>,
        O: Evaluation<()>,
    {
        poll_value_with(self.clock(), condition, &self.wait_policy).await
    }

    /// Locate and act under the engine's default search policy
    pub async fn locate<T, Fetch, FetchFut, Pred, PredFut, P, Act, ActFut, Reveal, RevealFut>(
        &self,
        fetch_items: Fetch,
        predicate: Pred,
        action: Act,
        reveal_more: Reveal,
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
            self.clock(),
            fetch_items,
            predicate,
            action,
            reveal_more,
            &self.search_policy,
            None,
        )
        .await
    }

    pub async fn locate_and_act<T, Fetch, FetchFut, Pred, PredFut, P, Act, ActFut, Reveal, RevealFut>(
        &self,
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
        locate_and_act_with(self.clock(), fetch_items, predicate, action, reveal_more, policy, None).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn locate_and_act_cancellable<
        T,
        Fetch,
        FetchFut,
        Pred,
        PredFut,
        P,
        Act,
        ActFut,
        Reveal,
        RevealFut,
    >(
        &self,
        fetch_items: Fetch,
        predicate: Pred,
        action: Act,
        reveal_more: Reveal,
        policy: &RetrySearchPolicy,
        cancel: &CancellationToken,
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
            self.clock(),
            fetch_items,
            predicate,
            action,
            reveal_more,
            policy,
            Some(cancel),
        )
        .await
    }

    pub async fn resolve_index<L, F>(&self, header_lookup: L, target_label: &str, policy: &WaitPolicy) -> WaitResult<usize>
    where
        L: FnMut() -> F,
        F: Future<Output = WaitResult<Vec<String>>>,
    {
        resolve_index_with(self.clock(), header_lookup, target_label, policy).await
    }

    /// Run `work` inside a reported step; the step passes when `work` is `Ok`
    pub async fn report_step<T, W>(&self, description: &str, work: W) -> WaitResult<T>
    where
        W: Future<Output = WaitResult<T>>,
    {
        self.report_step_with(description, work, |result| {
            if result.is_ok() {
                StepOutcome::Passed
            } else {
                StepOutcome::Failed
            }
        })
        .await
    }

    /// Run `work` inside a reported step with a custom pass/fail rule
    pub async fn report_step_with<T, W, K>(&self, description: &str, work: W, classify: K) -> WaitResult<T>
    where
        W: Future<Output = WaitResult<T>>,
        K: FnOnce(&WaitResult<T>) -> StepOutcome,
    {
        self.best_effort("start_step", self.reporter.start_step(description));
        let result = work.await;
        self.best_effort("end_step", self.reporter.end_step(classify(&result)));
        result
    }

    pub fn attach_best_effort(&self, name: &str, bytes: &[u8], mime_type: &str) {
        self.best_effort("attach", self.reporter.attach(name, bytes, mime_type));
    }

    /// Capture the source's current state and attach it as a PNG
    ///
    /// Capture or attach failures are logged only.
    pub async fn attach_screenshot<S: LiveStateSource>(&self, source: &S, description: &str) {
        match source.screenshot().await {
            Ok(Some(png)) => {
                let name = sanitized_file_name(description, chrono::Utc::now());
                self.attach_best_effort(&name, &png, PNG_MIME);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, step = description, "Screenshot capture failed"),
        }
    }

    fn best_effort(&self, operation: &str, result: anyhow::Result<()>) {
        if let Err(e) = result {
            warn!(operation, error = %e, "Reporter call failed, continuing");
        }
    }
}

impl Default for WaitEngine {
    fn default() -> Self {
        Self::new(WaitPolicy::default(), RetrySearchPolicy::default())
    }
}

impl std::fmt::Debug for WaitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitEngine")
            .field("wait_policy", &self.wait_policy)
            .field("search_policy", &self.search_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MemoryReporter, ReportEvent};
    use crate::utils::WaitError;

    struct FailingReporter;

    impl Reporter for FailingReporter {
        fn start_step(&self, _description: &str) -> anyhow::Result<()> {
            anyhow::bail!("report directory missing")
        }

        fn attach(&self, _name: &str, _bytes: &[u8], _mime_type: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }

        fn end_step(&self, _outcome: StepOutcome) -> anyhow::Result<()> {
            anyhow::bail!("report directory missing")
        }
    }

    #[tokio::test]
    async fn reporter_failures_do_not_mask_outcomes() {
        let engine = WaitEngine::default().with_reporter(Arc::new(FailingReporter));

        let ok = engine.report_step("ok step", async { Ok(5) }).await;
        assert_eq!(ok, Ok(5));

        let err = engine
            .report_step("failing step", async { Err::<(), _>(WaitError::Fetch("boom".into())) })
            .await;
        assert_eq!(err, Err(WaitError::Fetch("boom".into())));

        engine.attach_best_effort("x.png", &[0], PNG_MIME);
    }

    #[tokio::test]
    async fn report_step_records_outcome() {
        let reporter = Arc::new(MemoryReporter::new());
        let engine = WaitEngine::default().with_reporter(reporter.clone());

        let _ = engine
            .report_step("wait for spinner", async { Err::<(), _>(WaitError::timeout(Default::default(), None)) })
            .await;

        assert_eq!(
            reporter.events(),
            vec![
                ReportEvent::StepStarted { description: "wait for spinner".into() },
                ReportEvent::StepEnded { outcome: StepOutcome::Failed },
            ]
        );
    }
}
