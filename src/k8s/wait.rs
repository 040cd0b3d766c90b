//! Bounded wait-for-condition polling

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum WaitError<E: std::error::Error + 'static> {
    #[error("timed out after {timeout:?} waiting for {condition}")]
    TimedOut { condition: String, timeout: Duration },

    #[error(transparent)]
    Check(#[from] E),
}

/// Poll `check` at `interval` until it yields `Some(value)` or `timeout`
/// elapses. The condition is checked once immediately, so a zero timeout
/// still observes the current state.
pub async fn poll_until<T, E, F, Fut>(
    condition: &str,
    interval: Duration,
    timeout: Duration,
    mut check: F,
) -> Result<T, WaitError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(WaitError::TimedOut {
                condition: condition.to_string(),
                timeout,
            });
        }
        tokio::time::sleep(interval).await;
    }
}
