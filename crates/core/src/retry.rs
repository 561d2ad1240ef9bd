//! Bounded retry with exponential backoff
//!
//! Every remote call made by a transfer unit goes through [`with_backoff`].
//! The pool never retries; retry is the unit's responsibility.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Longest backoff exponent; keeps the sleep at 2^6 = 64 seconds.
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Delay before retry number `attempt` (zero-based): 2^attempt seconds.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(MAX_BACKOFF_SHIFT))
}

/// Run `op` up to `retry_times + 1` times, sleeping 2^attempt seconds
/// between attempts. Only retryable errors (network, integrity mismatch)
/// are retried; anything else returns immediately.
pub async fn with_backoff<T, F, Fut>(what: &str, retry_times: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < retry_times && err.is_retryable() => {
                tracing::warn!(
                    "{what} failed (attempt {} of {}): {err}",
                    attempt + 1,
                    retry_times + 1
                );
                tokio::time::sleep(backoff_delay(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_delay_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        // capped
        assert_eq!(backoff_delay(40), Duration::from_secs(64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_backoff("op", 5, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::Network("flaky".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_retry_times() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_backoff("op", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Network("down".into())) }
        })
        .await;

        assert!(result.is_err());
        // initial attempt + 3 retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_backoff("op", 5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::NotFound("gone".into())) }
        })
        .await;

        assert!(matches!(result.unwrap_err(), Error::NotFound(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_integrity_mismatch_is_retried() {
        let calls = AtomicU32::new(0);
        let result = with_backoff("part", 2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Error::IntegrityMismatch("etag".into()))
                } else {
                    Ok("etag")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "etag");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
