//! Bounded retry with a fixed delay.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::constants::{CAPTURE_MAX_ATTEMPTS, CAPTURE_RETRY_DELAY};

/// Fixed-delay retry policy applied around any fallible async call.
///
/// Intermediate failures are logged and swallowed; the error of the final
/// attempt is returned unmodified. There is no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: CAPTURE_MAX_ATTEMPTS,
            delay: CAPTURE_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` of 0 is treated as 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        operation = operation,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        retry_in_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_is_three_attempts_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(2));
    }

    #[test]
    fn zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let started = tokio::time::Instant::now();

        let result: Result<&str, String> = RetryPolicy::default()
            .run("start capture", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("attempt {n} failed"))
                } else {
                    Ok("started")
                }
            })
            .await;

        assert_eq!(result, Ok("started"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // two fixed backoffs between three attempts
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_last_error_unmodified() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), String> = RetryPolicy::default()
            .run("stop capture", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("attempt {n} failed"))
            })
            .await;

        assert_eq!(result, Err("attempt 3 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_success_does_not_sleep() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<u8, String> = RetryPolicy::new(3, Duration::from_secs(60))
            .run("noop", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
