use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::core::error::RefreshError;

/// Builds the shared HTTP client for a collaborator. The error carries the
/// service name so the failure reads like an outage of that collaborator.
pub fn service_client(service: &'static str) -> Result<reqwest::Client, RefreshError> {
    reqwest::Client::builder()
        .user_agent("coinlens/0.1")
        .build()
        .map_err(|e| RefreshError::unavailable(service, e))
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the last transport error
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
