//! Retry with exponential back-off and jitter for Anthropic API calls.
//!
//! Discovery and research calls run 30-60 s each with web search enabled,
//! so a dropped connection or a momentary 529 should not cost the user a
//! whole attempt. Only transient failures are retried; application-level
//! errors and malformed responses are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::anthropic::AnthropicError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// Retriable: network-level failures (timeout, connection reset), HTTP
/// 429 (rate limited), and 5xx (includes Anthropic's 529 overloaded).
/// Not retriable: other API errors (auth, invalid request) and
/// deserialization failures, since retrying won't fix them.
pub(crate) fn is_retriable(err: &AnthropicError) -> bool {
    match err {
        AnthropicError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        AnthropicError::Api { status, .. } => *status == 429 || *status >= 500,
        AnthropicError::Deserialize { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors. Delay doubles per attempt from `backoff_base_ms`,
/// capped at 60 s, with ±25 % jitter to avoid synchronized re-requests.
pub(crate) async fn with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AnthropicError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnthropicError>>,
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
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient Anthropic API error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
