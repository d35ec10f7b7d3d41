use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Whether a failed request is worth another attempt: the connection could
/// not be made or the request timed out. HTTP and body errors are final.
pub fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Runs `operation`, repeating it up to `retries` more times while it fails
/// with a transient transport error, sleeping `delay_ms` between attempts.
///
/// Returns the first success or the error of the last attempt made.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let attempts = retries + 1;
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) if attempt < attempts && is_transient(&err) => {
                debug!(attempt, attempts, error = %err, "Request failed, retrying");
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(err) => return Err(err),
        }
    }
}
