//! Bounded retry with fixed backoff, per-attempt timeout and cancellation

use std::future::Future;
use std::time::Duration;

use tokio::time::error::Elapsed;
use tokio_util::sync::CancellationToken;

/// Attempt budget and timing for one retried operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fresh timeout applied to every attempt
    pub attempt_timeout: Duration,
    /// Fixed delay between a retryable failure and the next attempt
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            attempt_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(30),
        }
    }
}

/// Errors that know whether another attempt may succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Terminal outcome of a failed retry loop
#[derive(Debug)]
pub enum RetryError<E> {
    /// Non-retryable error, returned as-is from the attempt that produced it
    Fatal(E),
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },
    /// The governing token fired during an attempt or a delay
    Cancelled,
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fatal(e) => write!(f, "{e}"),
            Self::Exhausted { .. } => f.write_str("too many retries, give up"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fatal(e) | Self::Exhausted { last: e, .. } => Some(e),
            Self::Cancelled => None,
        }
    }
}

/// Run `attempt_fn` until it succeeds, fails fatally, runs out of attempts
/// or `cancel` fires.
///
/// Each attempt is bounded by `policy.attempt_timeout`; an elapsed timeout is
/// converted through `E: From<Elapsed>` and classified like any other error.
/// Cancellation wins over both the in-flight attempt and the backoff sleep.
/// `attempt_fn` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt_fn: F,
) -> Result<T, RetryError<E>>
where
    E: Retryable + From<Elapsed> + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
            r = tokio::time::timeout(policy.attempt_timeout, attempt_fn(attempt)) => r,
        };
        let err = match outcome {
            Ok(Ok(v)) => return Ok(v),
            Ok(Err(e)) => e,
            Err(elapsed) => E::from(elapsed),
        };
        if !err.is_retryable() {
            return Err(RetryError::Fatal(err));
        }

        log::info!("{label} attempt {attempt}/{max_attempts}: {err}");
        if attempt == max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: err,
            });
        }
        log::info!("{label} sleep {}sec...", policy.retry_delay.as_secs());
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
            () = tokio::time::sleep(policy.retry_delay) => {}
        }
        attempt += 1;
    }
}
