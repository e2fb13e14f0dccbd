//! Bounded retry of whole transactions.

use std::future::Future;

use tracing::warn;

use stashbox_core::result::AppResult;

/// Run `attempt` and re-run it after a retryable failure.
///
/// Each call of `attempt` must open and commit its own transaction; a failed
/// attempt has already been rolled back by the time it is retried. At most
/// `retries` extra attempts are made.
pub async fn with_retry<T, F, Fut>(operation: &'static str, retries: u32, mut attempt: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut retried = 0;
    loop {
        match attempt().await {
            Err(err) if err.is_retryable() && retried < retries => {
                retried += 1;
                warn!(
                    operation,
                    attempt = retried,
                    error = %err,
                    "Transaction conflict, retrying"
                );
            }
            result => return result,
        }
    }
}
