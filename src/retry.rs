//! Exponential-backoff retry wrapper, independent of any HTTP concern.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::ClientOptions;

/// How many times, and after which delay, a failed operation is re-attempted.
///
/// The wait before retry `r` (1-indexed) is `2^r` seconds: no jitter, no cap.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RetryPolicy {
    retries: u32,
}

impl RetryPolicy {
    pub const fn new(retries: u32) -> Self {
        Self { retries }
    }

    /// Number of retries allowed after the first attempt.
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    /// Delay slept before retry `attempt`; saturates instead of overflowing.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_secs(secs)
    }

    /// Wraps `op` so that each call runs it under this policy.
    pub fn decorate<F>(&self, op: F) -> Retrying<F> {
        Retrying { policy: *self, op }
    }
}

impl From<&ClientOptions> for RetryPolicy {
    fn from(options: &ClientOptions) -> Self {
        Self::new(options.retries)
    }
}

/// An operation decorated with a [`RetryPolicy`].
pub struct Retrying<F> {
    policy: RetryPolicy,
    op: F,
}

impl<F> fmt::Debug for Retrying<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<F, Fut, T, E> Retrying<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    /// Runs the operation until it succeeds or the retries are spent.
    ///
    /// Any `Err` triggers a retry. When every attempt fails the last error
    /// is returned.
    ///
    /// `E: Display` is required even without the `tracing` feature, so the
    /// bound does not change with the feature set.
    pub async fn call(&mut self) -> Result<T, E> {
        let mut attempt = 0u32;
        loop {
            match (self.op)().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.policy.retries => return Err(err),
                Err(_err) => {
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "attempt failed ({}), retry {}/{} in {} s",
                        _err,
                        attempt,
                        self.policy.retries,
                        delay.as_secs()
                    );

                    sleep(delay).await;
                }
            }
        }
    }
}

/// Runs `op` under `policy` once. Shorthand for `policy.decorate(op).call()`.
pub async fn retry<F, Fut, T, E>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    policy.decorate(op).call().await
}
