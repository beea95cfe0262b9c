use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Execute an async operation with jittered exponential backoff.
///
/// Errors for which `should_retry` returns false are returned immediately.
pub async fn retry_with_backoff<F, Fut, T, E, R>(
    config: &RetryConfig,
    should_retry: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempts = 0;
    let mut backoff_ms = config.backoff_base_ms;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !should_retry(&e) => {
                warn!("Attempt {} failed with non-retryable error: {}", attempts, e);
                return Err(e);
            }
            Err(e) if attempts >= config.max_attempts => {
                warn!("All {} attempts failed: {}", attempts, e);
                return Err(e);
            }
            Err(e) => {
                // Jittered backoff: base * 2^attempt + random(0..base)
                let jitter = rand::random::<u64>() % config.backoff_base_ms.max(1);
                let delay = Duration::from_millis(backoff_ms + jitter);

                warn!(
                    "Attempt {} failed: {}. Retrying in {:?}...",
                    attempts, e, delay
                );

                sleep(delay).await;
                backoff_ms = backoff_ms.saturating_mul(2);
            }
        }
    }
}
