//! Database connection management using sqlx

use crate::error::InsightError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, warn};

pub type DbPool = PgPool;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Connect to PostgreSQL, retrying with exponential backoff.
///
/// `attempts` is clamped to at least one. Every attempt also runs a
/// `SELECT 1` so a pool is only returned once the server answers.
pub async fn init_pool(
    database_url: &str,
    max_connections: u32,
    attempts: u32,
) -> Result<PgPool, InsightError> {
    let attempts = attempts.max(1);
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=attempts {
        match try_connect(database_url, max_connections).await {
            Ok(pool) => {
                info!(attempt, "database connection established");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                warn!(attempt, error = %e, backoff_ms = backoff.as_millis() as u64, "database connection failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => {
                return Err(InsightError::ConnectionFailed(format!(
                    "giving up after {} attempt(s): {}",
                    attempts, e
                )));
            }
        }
    }

    Err(InsightError::ConnectionFailed("no connection attempt was made".to_string()))
}

async fn try_connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Map a sqlx error onto the executor error kinds: failures to reach the
/// database are connection failures, everything else is an execution failure.
pub fn classify_sqlx_error(e: sqlx::Error) -> InsightError {
    match &e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => InsightError::ConnectionFailed(e.to_string()),
        _ => InsightError::ExecutionFailed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_pool_timeout_as_connection_failure() {
        let err = classify_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, InsightError::ConnectionFailed(_)));
        assert!(err.is_execution_failure());
    }

    #[test]
    fn test_classify_row_errors_as_execution_failure() {
        let err = classify_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, InsightError::ExecutionFailed(_)));
    }
}
