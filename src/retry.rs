use std::future::Future;
use std::time::Duration;

/// HTTP status the remote APIs use for throttling.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    /// `step × attempt`: 30s, 60s, 90s, ... for a 30s step.
    Linear(Duration),
    Exponential { base: Duration, max: Duration },
}

impl Backoff {
    /// Wait after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(d) => d,
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Errors that can tell the retry loop which HTTP status caused them.
pub trait HttpStatusError {
    fn http_status(&self) -> Option<u16>;
}

/// Retry policy shared by the table store and FX clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub retry_on: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear(Duration::from_secs(2)),
            retry_on: vec![STATUS_TOO_MANY_REQUESTS],
        }
    }
}

impl RetryPolicy {
    /// Historical FX fetches: 5 attempts, waiting 30s × attempt on 429.
    pub fn rate_provider() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::Linear(Duration::from_secs(30)),
            retry_on: vec![STATUS_TOO_MANY_REQUESTS],
        }
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_on.contains(&status)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned as-is.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: HttpStatusError + std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let retryable = e.http_status().is_some_and(|s| self.is_retryable(s));
                    if !retryable || attempt >= max_attempts {
                        if retryable {
                            tracing::error!(
                                target_api = label,
                                attempts = attempt,
                                error = %e,
                                "Giving up after repeated throttling"
                            );
                        }
                        return Err(e);
                    }

                    let wait = self.backoff.delay(attempt);
                    tracing::warn!(
                        target_api = label,
                        attempt,
                        max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}
