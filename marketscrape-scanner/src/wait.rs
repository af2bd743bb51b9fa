//! Bounded waits on document readiness.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll: DEFAULT_POLL,
        }
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Poll `check` until it reports true or the timeout elapses.
    ///
    /// The check always runs at least once. Returns whether it succeeded.
    pub async fn until<F, Fut>(&self, mut check: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let started = Instant::now();
        loop {
            if check().await {
                return true;
            }
            if started.elapsed() >= self.timeout {
                return false;
            }
            let remaining = self.timeout.saturating_sub(started.elapsed());
            tokio::time::sleep(self.poll.min(remaining).max(Duration::from_millis(1))).await;
        }
    }
}

/// Upper bounds for each render the crawl waits on, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitTimings {
    pub detail_render_ms: u64,
    pub description_expand_ms: u64,
    pub seller_render_ms: u64,
    pub listings_render_ms: u64,
    pub poll_ms: u64,
}

impl Default for WaitTimings {
    fn default() -> Self {
        Self {
            detail_render_ms: 3000,
            description_expand_ms: 1000,
            seller_render_ms: 3000,
            listings_render_ms: 2000,
            poll_ms: 100,
        }
    }
}

impl WaitTimings {
    fn policy(&self, timeout_ms: u64) -> WaitPolicy {
        WaitPolicy::new(Duration::from_millis(timeout_ms))
            .with_poll(Duration::from_millis(self.poll_ms.max(1)))
    }

    pub fn detail_render(&self) -> WaitPolicy {
        self.policy(self.detail_render_ms)
    }

    pub fn description_expand(&self) -> WaitPolicy {
        self.policy(self.description_expand_ms)
    }

    pub fn seller_render(&self) -> WaitPolicy {
        self.policy(self.seller_render_ms)
    }

    pub fn listings_render(&self) -> WaitPolicy {
        self.policy(self.listings_render_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_until_returns_immediately_when_ready() {
        let policy = WaitPolicy::new(Duration::from_secs(3));
        let started = Instant::now();

        assert!(policy.until(|| async { true }).await);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_gives_up_at_timeout() {
        let policy = WaitPolicy::new(Duration::from_secs(2)).with_poll(Duration::from_millis(250));
        let started = Instant::now();

        assert!(!policy.until(|| async { false }).await);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_millis(2300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_succeeds_after_a_few_polls() {
        let calls = AtomicUsize::new(0);
        let policy = WaitPolicy::new(Duration::from_secs(5)).with_poll(Duration::from_millis(100));

        let ready = policy
            .until(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { n >= 3 }
            })
            .await;

        assert!(ready);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_default_timings_match_render_delays() {
        let timings = WaitTimings::default();
        assert_eq!(timings.detail_render().timeout, Duration::from_secs(3));
        assert_eq!(timings.description_expand().timeout, Duration::from_secs(1));
        assert_eq!(timings.seller_render().timeout, Duration::from_secs(3));
        assert_eq!(timings.listings_render().timeout, Duration::from_secs(2));
    }
}
