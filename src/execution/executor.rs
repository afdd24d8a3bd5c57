//! SQL executor contract consumed by the pipeline.

use crate::error::Result;
use crate::execution::result::RawResultSet;
use async_trait::async_trait;

/// Runs one SQL statement against the campaign warehouse.
///
/// Implementations own their connection lifecycle. A connection that cannot
/// be acquired is reported as `InsightError::ConnectionFailed`, a statement
/// the database rejects as `InsightError::ExecutionFailed`.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Executor name used in logs (e.g. "postgres").
    fn name(&self) -> &'static str;

    async fn execute(&self, sql: &str) -> Result<RawResultSet>;
}
