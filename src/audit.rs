//! Audit Logger
//!
//! Append-only record of every answered question. Writers report failures,
//! but the pipeline never lets an audit failure reach the user.

use crate::db::DbPool;
use crate::error::{InsightError, Result};
use crate::sanitize::truncate_chars;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Longest summary text stored in an audit record.
pub const MAX_AUDIT_SUMMARY_CHARS: usize = 4000;

/// One query/response interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub user_query: String,
    pub generated_sql: String,
    pub row_count: u64,
    pub summary_text: String,
    pub attributed_user: String,
}

impl AuditRecord {
    /// Build a record, truncating the summary to [`MAX_AUDIT_SUMMARY_CHARS`].
    pub fn new(
        user_query: impl Into<String>,
        generated_sql: impl Into<String>,
        row_count: usize,
        summary: &str,
        attributed_user: impl Into<String>,
    ) -> Self {
        Self {
            user_query: user_query.into(),
            generated_sql: generated_sql.into(),
            row_count: row_count as u64,
            summary_text: truncate_chars(summary, MAX_AUDIT_SUMMARY_CHARS).to_string(),
            attributed_user: attributed_user.into(),
        }
    }
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<()>;
}

/// Writes audit records to the `query_audit_log` table.
pub struct PgAuditLog {
    pool: DbPool,
}

impl PgAuditLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the audit table if it does not exist yet.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_audit_log (
                id UUID PRIMARY KEY,
                user_query TEXT NOT NULL,
                generated_sql TEXT NOT NULL,
                row_count BIGINT NOT NULL,
                summary_text VARCHAR(4000) NOT NULL,
                attributed_user TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| InsightError::Audit(format!("Failed to create audit table: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO query_audit_log
                (id, user_query, generated_sql, row_count, summary_text, attributed_user)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&record.user_query)
        .bind(&record.generated_sql)
        .bind(record.row_count as i64)
        .bind(&record.summary_text)
        .bind(&record.attributed_user)
        .execute(&self.pool)
        .await
        .map_err(|e| InsightError::Audit(format!("Failed to insert audit record: {}", e)))?;

        Ok(())
    }
}

#[derive(Serialize)]
struct AuditLine<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    record: &'a AuditRecord,
}

/// Appends audit records as JSON lines to a local file.
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let line = serde_json::to_string(&AuditLine {
            timestamp: Utc::now(),
            record,
        })?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| InsightError::Audit(format!("Failed to open audit log {}: {}", path.display(), e)))?;
            writeln!(file, "{}", line)
                .map_err(|e| InsightError::Audit(format!("Failed to write audit log: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(|e| InsightError::Audit(format!("Audit writer task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_truncated_to_limit() {
        let summary = "x".repeat(MAX_AUDIT_SUMMARY_CHARS + 500);
        let record = AuditRecord::new("q", "SELECT 1", 3, &summary, "anonymous");
        assert_eq!(record.summary_text.chars().count(), MAX_AUDIT_SUMMARY_CHARS);
        assert_eq!(record.row_count, 3);
    }

    #[tokio::test]
    async fn test_file_audit_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = FileAuditLog::new(path.clone());

        log.append(&AuditRecord::new("spend by channel", "SELECT 1", 2, "two rows", "anonymous"))
            .await
            .unwrap();
        log.append(&AuditRecord::new("clicks", "SELECT 2", 0, "none", "anonymous"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["user_query"], "spend by channel");
        assert_eq!(first["row_count"], 2);
        assert!(first["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_file_audit_log_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAuditLog::new(dir.path().join("missing").join("audit.jsonl"));
        let err = log
            .append(&AuditRecord::new("q", "SELECT 1", 0, "", "anonymous"))
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::Audit(_)));
    }
}
