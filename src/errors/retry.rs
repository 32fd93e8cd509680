use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use super::types::ScoutError;

/// Backoff for the decision and vision calls, the only remote calls a scrape
/// makes besides the browser itself.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// First backoff step for transient failures; doubles per attempt.
    pub base_delay: Duration,
    /// Ceiling for transient-failure backoff.
    pub max_delay: Duration,
    /// Wait after a 429. Grows linearly with the attempt, up to four times this value.
    pub rate_limit_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            rate_limit_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// How long to wait before retry number `attempt + 1`.
    pub fn delay_for(&self, error: &ScoutError, attempt: u32) -> Duration {
        match error {
            ScoutError::RateLimit(_) => {
                let steps = attempt.saturating_add(1).min(4);
                self.rate_limit_delay.saturating_mul(steps)
            }
            _ => {
                let backoff = self.base_delay.saturating_mul(1u32 << attempt.min(16));
                let jitter = self.base_delay.mul_f64(rand::random::<f64>());
                backoff.saturating_add(jitter).min(self.max_delay)
            }
        }
    }
}

/// Run `factory` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. The last error is returned as-is.
pub async fn with_retry<F, Fut, T>(operation: &str, config: &RetryConfig, mut factory: F) -> Result<T, ScoutError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScoutError>>,
{
    let mut attempt = 0;
    loop {
        let error = match factory().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let class = error.classify();
        if !class.retryable {
            debug!(operation, error_type = class.error_type, "Not retrying");
            return Err(error);
        }
        if attempt >= config.max_retries {
            warn!(operation, attempts = attempt + 1, error = %error, "Giving up");
            return Err(error);
        }

        let delay = config.delay_for(&error, attempt);
        warn!(
            operation,
            attempt = attempt + 1,
            error_type = class.error_type,
            delay_ms = delay.as_millis() as u64,
            "Retrying model call"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn immediate(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_rate_limit_delay_grows_then_caps() {
        let config = RetryConfig::default();
        let err = ScoutError::RateLimit("429".into());
        assert_eq!(config.delay_for(&err, 0), Duration::from_secs(30));
        assert_eq!(config.delay_for(&err, 1), Duration::from_secs(60));
        assert_eq!(config.delay_for(&err, 9), Duration::from_secs(120));
    }

    #[test]
    fn test_transient_delay_is_exponential_and_bounded() {
        let config = RetryConfig::default();
        let err = ScoutError::Network("reset".into());
        let d0 = config.delay_for(&err, 0);
        let d2 = config.delay_for(&err, 2);
        assert!(d0 >= Duration::from_secs(1) && d0 <= Duration::from_secs(2));
        assert!(d2 >= Duration::from_secs(4) && d2 <= Duration::from_secs(5));
        assert_eq!(config.delay_for(&err, 40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result = with_retry("decide", &immediate(3), move || async move {
            match attempts.fetch_add(1, Ordering::SeqCst) {
                0 => Err(ScoutError::Network("connection reset".into())),
                1 => Err(ScoutError::RateLimit("429".into())),
                _ => Ok("clicked"),
            }
        }).await;
        assert_eq!(result.unwrap(), "clicked");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<(), _> = with_retry("extract", &immediate(3), move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ScoutError::MalformedResponse("no valid JSON".into()))
        }).await;
        assert!(matches!(result, Err(ScoutError::MalformedResponse(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_exhausted_returns_last_error() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<(), _> = with_retry("decide", &immediate(2), move || async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            Err(ScoutError::Timeout(format!("attempt {}", n)))
        }).await;
        match result {
            Err(ScoutError::Timeout(msg)) => assert_eq!(msg, "attempt 2"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_none_makes_single_attempt() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<(), _> = with_retry("decide", &RetryConfig::none(), move || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(ScoutError::Network("timeout".into()))
        }).await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
