//! Rate limiting and hard timeouts for outbound model requests.
//!
//! The limiter is a sliding window of request timestamps shared by every turn
//! in the process. `try_acquire` evicts expired timestamps and then either
//! records a new one or refuses without side effect. [`GuardedLlmClient`]
//! wraps any [`LlmPort`] so a refused or hung request comes back as an
//! [`LlmError`] instead of a network call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mythicbot_domain::EngineSettings;

use crate::infrastructure::ports::{ClockPort, LlmError, LlmPort, LlmRequest, LlmResponse};

/// Configuration for the sliding request window
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Length of the window
    pub window: Duration,
    /// Requests allowed inside one window
    pub max_requests: usize,
    /// When false every acquisition succeeds
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10),
            max_requests: 6,
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    /// Create config from EngineSettings values
    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            window: Duration::from_secs(settings.rate_window_secs),
            max_requests: settings.rate_max_requests,
            enabled: settings.features.ai_rate_limiting,
        }
    }
}

/// Process-wide sliding-window rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn ClockPort>,
    /// Timestamps of admitted requests, oldest first
    window: Mutex<VecDeque<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            config,
            clock,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Try to admit one request now.
    pub fn try_acquire(&self) -> bool {
        if !self.config.enabled {
            return true;
        }

        let now = self.clock.now();
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut window, now);

        if window.len() >= self.config.max_requests {
            tracing::debug!(
                in_window = window.len(),
                max_requests = self.config.max_requests,
                "Rate limiter rejecting request"
            );
            return false;
        }

        window.push_back(now);
        true
    }

    /// Requests currently counted against the window.
    pub fn in_window(&self) -> usize {
        let now = self.clock.now();
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        self.evict_expired(&mut window, now);
        window.len()
    }

    fn evict_expired(&self, window: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) {
        while let Some(oldest) = window.front() {
            let expired = now
                .signed_duration_since(*oldest)
                .to_std()
                .is_ok_and(|age| age >= self.config.window);
            if expired {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Error returned when a guarded future outlives its deadline
#[derive(Debug, Clone, thiserror::Error)]
#[error("Operation timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// Run `future` to completion or give up after `limit`.
pub async fn with_timeout<F, T>(limit: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| TimeoutError(limit))
}

/// Wrapper that puts any LLM client behind the shared limiter and a hard timeout
pub struct GuardedLlmClient {
    inner: Arc<dyn LlmPort>,
    limiter: Arc<RateLimiter>,
    timeout: Duration,
}

impl GuardedLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, limiter: Arc<RateLimiter>, timeout: Duration) -> Self {
        Self {
            inner,
            limiter,
            timeout,
        }
    }
}

#[async_trait]
impl LlmPort for GuardedLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        if !self.limiter.try_acquire() {
            tracing::warn!("LLM request rejected by rate limiter");
            return Err(LlmError::RateLimited);
        }

        match with_timeout(self.timeout, self.inner.generate(request)).await {
            Ok(result) => result,
            Err(TimeoutError(limit)) => {
                tracing::warn!(timeout_ms = limit.as_millis() as u64, "LLM request timed out");
                Err(LlmError::Timeout(limit))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::ports::{FinishReason, MockLlmPort};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn limiter(max_requests: usize, enabled: bool) -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = RateLimitConfig {
            window: Duration::from_secs(10),
            max_requests,
            enabled,
        };
        (clock.clone(), RateLimiter::new(config, clock))
    }

    fn ok_response() -> LlmResponse {
        LlmResponse {
            content: "ok".to_string(),
            finish_reason: FinishReason::Stop,
            usage: None,
        }
    }

    #[test]
    fn test_rejects_request_over_limit_within_window() {
        let (clock, limiter) = limiter(6, true);
        for _ in 0..6 {
            assert!(limiter.try_acquire());
            clock.advance(chrono::Duration::seconds(1));
        }
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.in_window(), 6);
    }

    #[test]
    fn test_admits_again_after_window_elapses() {
        let (clock, limiter) = limiter(2, true);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        clock.advance(chrono::Duration::seconds(10));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_window_slides_one_timestamp_at_a_time() {
        let (clock, limiter) = limiter(2, true);
        assert!(limiter.try_acquire());
        clock.advance(chrono::Duration::seconds(6));
        assert!(limiter.try_acquire());
        clock.advance(chrono::Duration::seconds(5));
        // first timestamp is 11s old, second only 5s
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_rejection_has_no_side_effect() {
        let (_clock, limiter) = limiter(1, true);
        assert!(limiter.try_acquire());
        for _ in 0..5 {
            assert!(!limiter.try_acquire());
        }
        assert_eq!(limiter.in_window(), 1);
    }

    #[test]
    fn test_disabled_limiter_always_admits() {
        let (_clock, limiter) = limiter(1, false);
        for _ in 0..20 {
            assert!(limiter.try_acquire());
        }
    }

    #[tokio::test]
    async fn test_with_timeout_gives_up() {
        let result = with_timeout(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            1
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_with_timeout_passes_value_through() {
        let result = with_timeout(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(result.expect("completes in time"), 7);
    }

    #[tokio::test]
    async fn test_guarded_client_skips_network_when_limited() {
        let (_clock, limiter) = limiter(1, true);
        let limiter = Arc::new(limiter);

        let mut mock = MockLlmPort::new();
        mock.expect_generate().times(1).returning(|_| Ok(ok_response()));
        let client = GuardedLlmClient::new(Arc::new(mock), limiter, Duration::from_secs(1));

        assert!(client.generate(LlmRequest::prompt("one")).await.is_ok());
        let second = client.generate(LlmRequest::prompt("two")).await;
        assert!(matches!(second, Err(LlmError::RateLimited)));
    }

    struct HangingLlm {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmPort for HangingLlm {
        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ok_response())
        }
    }

    #[tokio::test]
    async fn test_guarded_client_times_out_hung_request() {
        let (_clock, limiter) = limiter(6, true);
        let inner = Arc::new(HangingLlm {
            calls: AtomicU32::new(0),
        });
        let client =
            GuardedLlmClient::new(inner.clone(), Arc::new(limiter), Duration::from_millis(20));

        let result = client.generate(LlmRequest::prompt("hello")).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
