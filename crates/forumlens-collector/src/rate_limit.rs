//! Client-side rate limiting and retry for forum API calls.
//!
//! [`RateLimiter`] spaces requests evenly inside the configured budget and
//! additionally waits out the server window once the API reports that no
//! requests remain. [`retry_with_backoff`] retries transient failures with an
//! exponential delay.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::CollectorError;

/// Paces outgoing requests.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    state: Mutex<LimiterState>,
}

#[derive(Debug, Default)]
struct LimiterState {
    next_allowed: Option<Instant>,
    server_reset_at: Option<Instant>,
}

impl RateLimiter {
    /// Allow at most `requests_per_minute` requests, evenly spaced.
    ///
    /// A value of `0` is treated as `1`.
    #[must_use]
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let rpm = u64::from(requests_per_minute.max(1));
        Self::with_interval(Duration::from_millis(60_000 / rpm))
    }

    #[must_use]
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: Mutex::new(LimiterState::default()),
        }
    }

    /// No client-side spacing; server-reported windows still apply.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next request may be sent and reserve its slot.
    pub async fn acquire(&self) {
        let mut state = self.state.lock().await;

        let now = Instant::now();
        let mut ready_at = state.next_allowed.unwrap_or(now);
        if let Some(reset_at) = state.server_reset_at {
            if reset_at > ready_at {
                ready_at = reset_at;
            }
        }

        if ready_at > now {
            tracing::debug!(
                wait_ms = u64::try_from((ready_at - now).as_millis()).unwrap_or(u64::MAX),
                "rate limiter waiting before next request"
            );
            tokio::time::sleep_until(ready_at).await;
        }

        let sent_at = Instant::now();
        state.server_reset_at = None;
        state.next_allowed = Some(sent_at + self.min_interval);
    }

    /// Record the server's remaining budget from response headers.
    ///
    /// When `remaining` drops below one request, the next [`acquire`](Self::acquire)
    /// blocks until `reset_secs` have elapsed.
    pub async fn observe(&self, remaining: Option<f64>, reset_secs: Option<f64>) {
        let (Some(remaining), Some(reset_secs)) = (remaining, reset_secs) else {
            return;
        };
        if remaining >= 1.0 || !reset_secs.is_finite() || reset_secs <= 0.0 {
            return;
        }

        // Reddit windows are ten minutes; anything longer is a bad header.
        let wait = Duration::from_secs_f64(reset_secs.min(600.0));
        tracing::warn!(
            reset_secs,
            "forum API request budget exhausted; pausing until window resets"
        );
        let mut state = self.state.lock().await;
        state.server_reset_at = Some(Instant::now() + wait);
    }
}

/// Returns `true` if `err` is transient and worth retrying.
///
/// Only HTTP 429 and network-level failures qualify; bad statuses and
/// unparseable bodies would fail the same way again.
fn is_retriable(err: &CollectorError) -> bool {
    matches!(
        err,
        CollectorError::RateLimited { .. } | CollectorError::Http(_)
    )
}

/// Executes `operation`, retrying transient errors with exponential backoff.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds, or the server's `Retry-After` hint when that is longer. With
/// `max_retries = 3` the operation runs at most 4 times; after that the last
/// error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, CollectorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollectorError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let mut delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        if let CollectorError::RateLimited { retry_after_secs } = &err {
            delay_secs = delay_secs.max(*retry_after_secs);
        }
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient forum API error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited(retry_after_secs: u64) -> CollectorError {
        CollectorError::RateLimited { retry_after_secs }
    }

    #[test]
    fn per_minute_spaces_requests_evenly() {
        assert_eq!(
            RateLimiter::per_minute(60).min_interval(),
            Duration::from_secs(1)
        );
        assert_eq!(
            RateLimiter::per_minute(120).min_interval(),
            Duration::from_millis(500)
        );
        assert_eq!(
            RateLimiter::per_minute(0).min_interval(),
            Duration::from_secs(60)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_min_interval() {
        let limiter = RateLimiter::per_minute(60);
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let limiter = RateLimiter::per_minute(1);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_blocks_until_reset() {
        let limiter = RateLimiter::unlimited();
        limiter.acquire().await;
        limiter.observe(Some(0.0), Some(30.0)).await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_budget_does_not_block() {
        let limiter = RateLimiter::unlimited();
        limiter.observe(Some(42.0), Some(300.0)).await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, CollectorError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(rate_limited(0))
                } else {
                    Ok::<u32, CollectorError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(2, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, CollectorError>(rate_limited(0))
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(CollectorError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_unexpected_status() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_backoff(3, 0, || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, CollectorError>(CollectorError::UnexpectedStatus {
                    status: 403,
                    url: "https://oauth.reddit.com/r/private/search".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(CollectorError::UnexpectedStatus { status: 403, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn honours_retry_after_when_longer_than_backoff() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let start = Instant::now();
        let result = retry_with_backoff(1, 1, || {
            let cc = Arc::clone(&cc);
            async move {
                if cc.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rate_limited(10))
                } else {
                    Ok::<u32, CollectorError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }
}
