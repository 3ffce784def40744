//! Re-running single-statement writes that lost a write conflict.
//!
//! SurrealDB commits optimistically: when two transactions touch the
//! same record, one of them fails with a conflict and has to be run
//! again. Statements passed through here read the record they write,
//! so a rerun applies to the latest committed state.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::DbError;

/// Upper bound on attempts for one write.
const MAX_ATTEMPTS: u32 = 64;
/// First backoff ceiling; doubled per attempt up to `MAX_DELAY_MS`.
const BASE_DELAY_MS: u64 = 1;
const MAX_DELAY_MS: u64 = 32;

/// Random delay in `1..=ceiling` milliseconds ("full jitter"), so that
/// writers which collided once do not collide again in lockstep.
fn backoff(attempt: u32) -> Duration {
    let ceiling = (BASE_DELAY_MS << attempt.min(5)).min(MAX_DELAY_MS);
    let jitter = u64::from(Utc::now().timestamp_subsec_nanos()) % ceiling;
    Duration::from_millis(jitter + 1)
}

/// Run `write` until it succeeds, fails with anything other than a
/// write conflict, or runs out of attempts.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    operation: &str,
    mut write: F,
) -> Result<T, DbError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(err) if err.is_conflict() && attempt < MAX_ATTEMPTS => {
                debug!(operation, attempt, "Write conflict, retrying");
                tokio::time::sleep(backoff(attempt)).await;
                attempt += 1;
            }
            Err(err) if err.is_conflict() => {
                warn!(operation, attempts = attempt, "Write conflict persisted");
                return Err(err);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_stays_within_ceiling() {
        for attempt in 0..20 {
            let delay = backoff(attempt).as_millis() as u64;
            assert!((1..=MAX_DELAY_MS).contains(&delay), "attempt {attempt}: {delay}ms");
        }
    }

    #[tokio::test]
    async fn conflicts_are_retried_until_success() {
        let mut calls = 0;
        let result = retry_on_conflict("test", || {
            calls += 1;
            let outcome = if calls < 3 {
                Err(DbError::Conflict("retry the transaction".into()))
            } else {
                Ok(calls)
            };
            async move { outcome }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), DbError> = retry_on_conflict("test", || {
            calls += 1;
            async { Err(DbError::Query("syntax".into())) }
        })
        .await;
        assert!(matches!(result, Err(DbError::Query(_))));
        assert_eq!(calls, 1);
    }
}
