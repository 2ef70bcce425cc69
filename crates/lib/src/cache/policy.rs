//! Uniform handling of cache transport failures.
//!
//! [`recover`] is a pure function of the fault and an optional fallback: it
//! logs at the level the fault class warrants and either hands back the
//! fallback or raises [`CacheError::OperationFailed`].

use std::future::Future;
use std::time::Duration;

use crate::Result;
use crate::cache::errors::{CacheError, CacheFault, FaultKind};

/// Log `fault` and resolve it to `fallback`, or to `OperationFailed` when there is none.
pub fn recover<T>(operation: &'static str, fault: CacheFault, fallback: Option<T>) -> Result<T> {
    match fault.kind {
        FaultKind::ConnectionFailure => {
            tracing::error!(operation, error = %fault.message, "Cache connection failure");
        }
        FaultKind::Timeout => {
            tracing::warn!(operation, error = %fault.message, "Cache operation timed out");
        }
        FaultKind::Serialization => {
            tracing::error!(operation, error = %fault.message, "Cache serialization error");
        }
        FaultKind::Other => {
            tracing::error!(operation, error = %fault.message, "Cache operation failed");
        }
    }

    match fallback {
        Some(value) => Ok(value),
        None => Err(CacheError::OperationFailed {
            operation,
            kind: fault.kind,
            reason: fault.message,
        }
        .into()),
    }
}

/// Run a backend call under `limit`. Expiry becomes a [`FaultKind::Timeout`] fault.
pub async fn bounded<T, F>(limit: Duration, call: F) -> std::result::Result<T, CacheFault>
where
    F: Future<Output = std::result::Result<T, CacheFault>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CacheFault::timeout(format!(
            "no response within {}ms",
            limit.as_millis()
        ))),
    }
}

/// [`bounded`] followed by [`recover`] on failure.
pub async fn guarded<T, F>(
    operation: &'static str,
    limit: Duration,
    fallback: Option<T>,
    call: F,
) -> Result<T>
where
    F: Future<Output = std::result::Result<T, CacheFault>>,
{
    match bounded(limit, call).await {
        Ok(value) => Ok(value),
        Err(fault) => recover(operation, fault, fallback),
    }
}
