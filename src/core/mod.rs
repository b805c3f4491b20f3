//! Core business logic - campaign aggregation, payment recording, recompute
//! sweeps, and lifecycle transitions.
//!
//! Functions in this module tree talk to the database through `SeaORM` and
//! know nothing about HTTP or timers. Write paths that read campaign state
//! before rewriting it run under [`retry_on_conflict`], so transient `SQLite`
//! lock contention between the aggregation worker, the recorder, and the
//! recompute sweep is retried instead of surfacing to callers.

pub mod aggregator;
pub mod campaigns;
pub mod donations;
pub mod lifecycle;
pub mod recompute;
pub mod recorder;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::Result;

/// Maximum attempts for a write that keeps hitting lock contention
const TXN_MAX_RETRIES: u32 = 5;

/// First retry delay, doubled after every failed attempt
const BACKOFF_BASE: Duration = Duration::from_millis(25);

/// Runs a database operation, retrying on transient write conflicts.
///
/// The closure is re-invoked with exponential backoff when the returned error
/// is a transient conflict (`SQLITE_BUSY` and friends). Any other error, or
/// exhaustion of the retry budget, is returned to the caller unchanged.
pub(crate) async fn retry_on_conflict<T, F, Fut>(mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut backoff = BACKOFF_BASE;
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient_conflict() && attempt < TXN_MAX_RETRIES => {
                warn!("write conflict on attempt {attempt}, retrying in {backoff:?}");
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use sea_orm::{DbErr, RuntimeErr};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn locked_error() -> Error {
        Error::Database(DbErr::Query(RuntimeErr::Internal(
            "error returned from database: (code: 5) database is locked".to_string(),
        )))
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_conflicts() {
        let attempts = AtomicU32::new(0);
        let result = retry_on_conflict(|| {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(locked_error())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget_exhausted() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_on_conflict(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(locked_error()) }
        })
        .await;

        assert!(result.unwrap_err().is_transient_conflict());
        assert_eq!(attempts.load(Ordering::SeqCst), TXN_MAX_RETRIES);
    }

    #[tokio::test]
    async fn test_non_conflict_errors_pass_through_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_on_conflict(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(Error::Validation {
                    message: "nope".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
