//! Fixed-delay retry of fallible async operations.
//!
//! [`run`] knows nothing about what the operation does. Errors opt into
//! retrying through [`Retryable`]; anything else stops the loop at once
//! without spending the remaining attempts.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Whether an error is worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Attempt budget and fixed wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `attempts` of 0 is treated as 1.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Why [`run`] gave up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: E },

    /// A non-retryable error ended the loop early
    #[error("{0}")]
    Terminal(E),
}

impl<E> RetryError<E> {
    /// The error that ended the loop.
    pub fn into_last(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Terminal(e) => e,
        }
    }
}

/// Run `op` until it succeeds, fails terminally, or the budget is spent.
///
/// `op` receives the 1-based attempt number. The delay is only awaited
/// between attempts, never after the last one.
pub async fn run<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(RetryError::Terminal(e)),
            Err(e) if attempt >= policy.attempts => {
                tracing::error!("All {} attempts failed: {}", policy.attempts, e);
                return Err(RetryError::Exhausted {
                    attempts: policy.attempts,
                    last: e,
                });
            }
            Err(e) => {
                tracing::warn!(
                    "Attempt {} failed: {}. Retrying in {:?}",
                    attempt,
                    e,
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Flaky;

    impl fmt::Display for Flaky {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("flaky")
        }
    }

    impl Retryable for Flaky {
        fn is_retryable(&self) -> bool {
            true
        }
    }

    fn paused_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap()
    }

    proptest! {
        /// k failures then success: invocations and waiting time follow the budget
        #[test]
        fn calls_and_waits_match_budget(k in 0u32..6, attempts in 1u32..8, delay_ms in 1u64..10_000) {
            let rt = paused_runtime();
            let delay = Duration::from_millis(delay_ms);
            let calls = AtomicU32::new(0);

            let (result, elapsed) = rt.block_on(async {
                let start = tokio::time::Instant::now();
                let result = run(RetryPolicy::new(attempts, delay), |_| {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move { if n <= k { Err(Flaky) } else { Ok(n) } }
                })
                .await;
                (result, start.elapsed())
            });

            if attempts > k {
                prop_assert_eq!(result.ok(), Some(k + 1));
                prop_assert_eq!(calls.load(Ordering::SeqCst), k + 1);
                prop_assert!(elapsed >= delay * k);
                prop_assert!(elapsed <= delay * k + Duration::from_millis(u64::from(k) + 1));
            } else {
                let is_exhausted = matches!(result, Err(RetryError::Exhausted { attempts: a, .. }) if a == attempts);
                prop_assert!(is_exhausted);
                prop_assert_eq!(calls.load(Ordering::SeqCst), attempts);
                prop_assert!(elapsed >= delay * (attempts - 1));
                prop_assert!(elapsed <= delay * (attempts - 1) + Duration::from_millis(u64::from(attempts)));
            }
        }
    }
}
