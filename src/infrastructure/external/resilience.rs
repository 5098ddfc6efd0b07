//! External-call resilience module
//!
//! Every external collaborator call goes through a `ResiliencePolicy`:
//! a hard timeout, bounded retries with exponential backoff and jitter,
//! and a circuit breaker that rejects calls outright after a run of
//! consecutive failures until a cooldown elapses.

use rand::Rng;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::application::config::ResilienceConfig;
use crate::domain::error::SchedulingError;

struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Rejects calls after `threshold` consecutive failures for `open_for`
pub struct CircuitBreaker {
    threshold: u32,
    open_for: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, open_for: Duration) -> Self {
        Self {
            threshold,
            open_for,
            state: Mutex::new(BreakerState {
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    /// Whether a call may proceed. An open circuit lets one trial call
    /// through once the cooldown has elapsed.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        match state.opened_at {
            None => true,
            Some(opened_at) if opened_at.elapsed() >= self.open_for => {
                state.opened_at = None;
                true
            }
            Some(_) => false,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        state.consecutive_failures = 0;
        state.opened_at = None;
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.threshold {
            state.opened_at = Some(Instant::now());
        }
    }

    pub fn is_open(&self) -> bool {
        let state = self.state.lock().expect("breaker lock poisoned");
        matches!(state.opened_at, Some(opened_at) if opened_at.elapsed() < self.open_for)
    }
}

/// Timeout + retry + circuit breaker around an async operation
pub struct ResiliencePolicy {
    config: ResilienceConfig,
    breaker: CircuitBreaker,
}

impl ResiliencePolicy {
    pub fn new(config: ResilienceConfig) -> Self {
        let breaker = CircuitBreaker::new(
            config.circuit_failure_threshold,
            Duration::from_secs(config.circuit_open_seconds),
        );
        Self { config, breaker }
    }

    /// Runs `operation`, retrying transient failures. Exhausted retries,
    /// timeouts and an open circuit all surface `UpstreamUnavailable`.
    pub async fn execute<T, F, Fut>(
        &self,
        label: &str,
        mut operation: F,
    ) -> Result<T, SchedulingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SchedulingError>>,
    {
        if !self.breaker.allow() {
            return Err(SchedulingError::UpstreamUnavailable(format!(
                "{label}: circuit open"
            )));
        }

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let mut attempt: u32 = 0;
        loop {
            let outcome = tokio::time::timeout(timeout, operation()).await;
            match outcome {
                Ok(Ok(value)) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Ok(Err(error)) => {
                    self.breaker.record_failure();
                    debug!(%error, label, attempt, "external call failed");
                }
                Err(_) => {
                    self.breaker.record_failure();
                    debug!(label, attempt, "external call timed out");
                }
            }

            if attempt >= self.config.max_retries {
                warn!(label, attempts = attempt + 1, "retries exhausted");
                return Err(SchedulingError::UpstreamUnavailable(format!(
                    "{label}: retries exhausted after {} attempts",
                    attempt + 1
                )));
            }
            if !self.breaker.allow() {
                return Err(SchedulingError::UpstreamUnavailable(format!(
                    "{label}: circuit opened mid-call"
                )));
            }

            tokio::time::sleep(self.backoff_delay(attempt)).await;
            attempt += 1;
        }
    }

    /// Exponential backoff with uniform jitter
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base_ms;
        let exponential = base.saturating_mul(1u64 << attempt.min(16));
        let jitter = rand::rng().random_range(0..=base);
        Duration::from_millis(exponential + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> ResilienceConfig {
        ResilienceConfig {
            max_retries: 2,
            backoff_base_ms: 1,
            timeout_ms: 100,
            circuit_failure_threshold: 5,
            circuit_open_seconds: 30,
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let policy = ResiliencePolicy::new(fast_config());
        let result = policy
            .execute("test", || async { Ok::<_, SchedulingError>(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let policy = ResiliencePolicy::new(fast_config());
        let calls = AtomicU32::new(0);
        let result = policy
            .execute("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SchedulingError::UpstreamUnavailable("flaky".into()))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_upstream_unavailable() {
        let policy = ResiliencePolicy::new(fast_config());
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = policy
            .execute("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SchedulingError::UpstreamUnavailable("down".into())) }
            })
            .await;
        assert!(matches!(
            result,
            Err(SchedulingError::UpstreamUnavailable(_))
        ));
        // first attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_circuit_opens_after_consecutive_failures() {
        let mut config = fast_config();
        config.circuit_failure_threshold = 3;
        let policy = ResiliencePolicy::new(config);

        let _: Result<u32, _> = policy
            .execute("test", || async {
                Err(SchedulingError::UpstreamUnavailable("down".into()))
            })
            .await;
        assert!(policy.breaker.is_open());

        // while open, calls are rejected without running the operation
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = policy
            .execute("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(1) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_half_open_trial_after_cooldown() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(0));
        breaker.record_failure();
        // zero cooldown: the next call is a half-open trial
        assert!(breaker.allow());
        breaker.record_success();
        assert!(!breaker.is_open());
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let mut config = fast_config();
        config.timeout_ms = 5;
        config.max_retries = 0;
        let policy = ResiliencePolicy::new(config);
        let result: Result<u32, _> = policy
            .execute("test", || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(1)
            })
            .await;
        assert!(matches!(
            result,
            Err(SchedulingError::UpstreamUnavailable(_))
        ));
    }
}
