//! Fixed-delay retry for broker startup

use super::PublishError;
use std::future::Future;
use std::time::Duration;

/// Runs `op` up to `attempts` times, sleeping `delay` between failures
///
/// `op` receives the 1-based attempt number. Returns the first success, or the last
/// error once every attempt has failed. `attempts` of zero is treated as one.
pub async fn retry_fixed<T, F, Fut>(
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, PublishError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, PublishError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("Giving up after {} attempt(s): {}", attempt, e);
                return Err(e);
            }
        }
    }
}
