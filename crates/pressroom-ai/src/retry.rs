//! Exponential backoff for provider calls.
//!
//! Rate limits, network failures, and 5xx responses are retried; auth
//! failures and 4xx request errors are not.

use std::future::Future;
use std::time::Duration;

use crate::error::AiError;

const MAX_DELAY_MS: u64 = 60_000;

pub(crate) fn is_retriable(err: &AiError) -> bool {
    match err {
        AiError::RateLimited { .. } | AiError::Http(_) => true,
        AiError::Api { status, .. } => *status >= 500,
        _ => false,
    }
}

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
fn retry_delay_ms(err: &AiError, backoff_base_secs: u64, attempt: u32) -> u64 {
    let backoff = backoff_delay_ms(backoff_base_secs, attempt);
    match err {
        AiError::RateLimited { retry_after_secs, .. } => {
            backoff.max(retry_after_secs.saturating_mul(1000).min(MAX_DELAY_MS))
        }
        _ => backoff,
    }
}

/// Runs `operation`, retrying transient errors up to `max_retries` extra
/// times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiError>>,
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
                    "transient AI provider error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pressroom_core::AiProvider;

    use super::*;

    #[test]
    fn classifies_errors() {
        let api = |status| AiError::Api {
            provider: AiProvider::Gemini,
            status,
            message: String::new(),
        };
        assert!(is_retriable(&api(529)));
        assert!(!is_retriable(&api(400)));
        assert!(is_retriable(&AiError::RateLimited {
            provider: AiProvider::OpenAi,
            retry_after_secs: 1,
        }));
        assert!(!is_retriable(&AiError::Unauthorized {
            provider: AiProvider::OpenAi,
            status: 401,
        }));
        assert!(!is_retriable(&AiError::EmptyResponse {
            provider: AiProvider::OpenAi,
        }));
    }

    #[test]
    fn rate_limit_waits_at_least_retry_after() {
        let limited = |retry_after_secs| AiError::RateLimited {
            provider: AiProvider::Anthropic,
            retry_after_secs,
        };
        assert_eq!(retry_delay_ms(&limited(20), 0, 1), 20_000);
        assert_eq!(retry_delay_ms(&limited(3_600), 0, 1), MAX_DELAY_MS);
        // A long backoff is not shortened by a small hint.
        assert!(retry_delay_ms(&limited(1), 8, 1) >= 6_000);

        let server_error = AiError::Api {
            provider: AiProvider::Anthropic,
            status: 503,
            message: String::new(),
        };
        assert_eq!(retry_delay_ms(&server_error, 0, 1), 0);
    }

    #[test]
    fn delay_stays_in_jitter_band() {
        for _ in 0..50 {
            let d = backoff_delay_ms(1, 2);
            assert!((1500..2500).contains(&d), "delay {d} outside jitter band");
        }
    }
}
