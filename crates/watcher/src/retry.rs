//! Backoff for the L1 RPC requests of the watcher.

use std::{future::Future, time::Duration};

/// The backoff policy of the L1 RPC requests.
///
/// A failed request is attempted again after `initial_backoff`, doubled on each further failure
/// when `exponential` is set and capped at `max_backoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// The number of attempts after the first one. `None` retries until success.
    pub max_retries: Option<usize>,
    /// The delay before the first retry.
    pub initial_backoff: Duration,
    /// The upper bound of the delay between two attempts.
    pub max_backoff: Duration,
    /// Whether the delay doubles after each failure.
    pub exponential: bool,
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(Some(10), 100, true)
    }
}

impl Retry {
    /// The default upper bound of the delay between two attempts.
    pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

    /// Returns a new [`Retry`] starting at `initial_backoff_ms` milliseconds.
    pub const fn new(
        max_retries: Option<usize>,
        initial_backoff_ms: u64,
        exponential: bool,
    ) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Self::DEFAULT_MAX_BACKOFF,
            exponential,
        }
    }

    /// Sets the upper bound of the delay between two attempts.
    pub const fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Runs the request until it succeeds or the retries are exhausted, in which case the last
    /// error is returned.
    pub async fn retry<F, Fut, T, E>(&self, request: &str, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Debug,
    {
        let mut failures = 0;
        loop {
            let error = match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };
            if self.max_retries.is_some_and(|max| failures >= max) {
                tracing::warn!(
                    target: "sync::watcher",
                    request,
                    ?error,
                    failures,
                    "giving up on L1 request"
                );
                return Err(error);
            }

            failures += 1;
            let backoff = self.backoff(failures);
            tracing::debug!(
                target: "sync::watcher",
                request,
                ?error,
                failures,
                ?backoff,
                "retrying L1 request"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// Returns the delay after the given number of consecutive failures.
    fn backoff(&self, failures: usize) -> Duration {
        if !self.exponential {
            return self.initial_backoff.min(self.max_backoff);
        }
        let doublings = failures.saturating_sub(1).min(31) as u32;
        self.initial_backoff.saturating_mul(1 << doublings).min(self.max_backoff)
    }
}
