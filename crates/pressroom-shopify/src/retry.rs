//! Exponential backoff with jitter for transient Shopify errors.
//!
//! Rate limits, network failures, and 5xx responses are retried. Everything
//! else (404, auth failures, bad JSON, GraphQL errors) is returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` if `err` is a transient condition worth retrying.
pub(crate) fn is_retriable(err: &ShopifyError) -> bool {
    match err {
        ShopifyError::RateLimited { .. } | ShopifyError::Http(_) => true,
        ShopifyError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at 60 s, then scaled by a random factor in `[0.75, 1.25)`.
fn backoff_delay_ms(backoff_base_secs: u64, attempt: u32) -> u64 {
    let computed = backoff_base_secs
        .saturating_mul(1000)
        .saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    jittered
}

/// Backoff for `attempt`, raised to the server's `Retry-After` on a 429.
/// The hint is capped like the backoff itself.
fn retry_delay_ms(err: &ShopifyError, backoff_base_secs: u64, attempt: u32) -> u64 {
    let backoff = backoff_delay_ms(backoff_base_secs, attempt);
    match err {
        ShopifyError::RateLimited { retry_after_secs, .. } => {
            backoff.max(retry_after_secs.saturating_mul(1000).min(MAX_DELAY_MS))
        }
        _ => backoff,
    }
}

/// Runs `operation`, retrying transient errors up to `max_retries` extra
/// times. With `max_retries = 3` the operation runs at most 4 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = retry_delay_ms(&err, backoff_base_secs, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient Shopify error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn rate_limited() -> ShopifyError {
        ShopifyError::RateLimited {
            domain: "test.example.com".to_owned(),
            retry_after_secs: 0,
        }
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        let status = |status| ShopifyError::UnexpectedStatus {
            status,
            url: "https://example.com".to_owned(),
        };
        assert!(is_retriable(&status(503)));
        assert!(!is_retriable(&status(403)));
        assert!(!is_retriable(&ShopifyError::Unauthorized { status: 401 }));
        assert!(!is_retriable(&ShopifyError::GraphQl("boom".to_owned())));
    }

    #[test]
    fn backoff_delay_is_capped_and_jittered() {
        for _ in 0..50 {
            let d = backoff_delay_ms(2, 1);
            assert!((1500..2500).contains(&d), "delay {d} outside jitter band");
            assert!(backoff_delay_ms(30, 8) < 75_000);
        }
        assert_eq!(backoff_delay_ms(0, 3), 0);
    }

    #[test]
    fn retry_after_raises_the_delay_floor() {
        let limited = ShopifyError::RateLimited {
            domain: "tea.example.com".to_owned(),
            retry_after_secs: 4,
        };
        assert_eq!(retry_delay_ms(&limited, 0, 1), 4_000);
        assert_eq!(retry_delay_ms(&rate_limited(), 0, 1), 0);
        assert_eq!(
            retry_delay_ms(&ShopifyError::Unauthorized { status: 401 }, 0, 2),
            0
        );
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ShopifyError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ShopifyError>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ShopifyError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn not_found_is_returned_without_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ShopifyError>(ShopifyError::NotFound {
                    url: "https://example.com/products.json".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ShopifyError::NotFound { .. })));
    }
}
