use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Time source used by the poller and the retry loop
///
/// Every call measures its own deadline from `now()`; implementations must
/// not share per-call timer state.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    /// Suspend the current task. Must not block the thread.
    async fn sleep(&self, duration: Duration);
}

/// `tokio::time` backed clock. Honours `tokio::time::pause()` in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
