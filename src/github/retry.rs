//! Retry logic with exponential backoff for idempotent API reads.

use crate::error::{HostingError, Result};
use tokio::time::{Duration, Instant};

/// Maximum backoff between attempts in seconds
const MAX_BACKOFF_SECONDS: u64 = 30;

/// Retry an async operation with exponential backoff
///
/// Recoverable errors (timeouts, transport failures, 5xx, 429) are retried
/// with 1s, 2s, 4s, ... waits; anything else is returned immediately. Only
/// wrap operations that are safe to repeat.
///
/// # Arguments
/// * `operation` - Async closure that returns Result<T>
/// * `max_retries` - Maximum number of retry attempts (0 = try once)
/// * `operation_name` - Human-readable name for logging
/// * `absolute_timeout` - Deadline for the whole retry sequence
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    max_retries: u32,
    operation_name: &str,
    absolute_timeout: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let deadline = start_time + absolute_timeout;
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempts > 0 {
                    log::info!("{operation_name} succeeded after {attempts} retry(ies)");
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_recoverable() || attempts >= max_retries {
                    return Err(e);
                }

                attempts += 1;
                let wait_seconds = 2u64.saturating_pow(attempts - 1).min(MAX_BACKOFF_SECONDS);
                let remaining = deadline.saturating_duration_since(Instant::now());
                let wait = Duration::from_secs(wait_seconds).min(remaining);

                if wait.is_zero() {
                    return Err(HostingError::Timeout {
                        operation: format!(
                            "{operation_name} (gave up after {attempts} attempts over {:.1}s)",
                            start_time.elapsed().as_secs_f64()
                        ),
                    }
                    .into());
                }

                log::warn!(
                    "{operation_name} failed (attempt {attempts}/{}): {e}; retrying in {:.1}s",
                    max_retries + 1,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}
