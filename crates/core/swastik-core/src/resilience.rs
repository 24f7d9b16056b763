//! Timeout race for backend calls

use crate::error::BackendError;
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single backend call
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(4);

/// Race `call` against a timer of `limit`
///
/// When the timer wins the call future is dropped and its eventual result is
/// never observed.
pub async fn race_timeout<F, T>(limit: Duration, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("backend call exceeded {}ms", limit.as_millis());
            Err(BackendError::Timeout(limit))
        }
    }
}
