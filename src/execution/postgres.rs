//! PostgreSQL Execution Engine
//!
//! Runs generated SQL through a sqlx pool and converts every cell into a
//! JSON scalar keyed by the column's position.

use crate::db::{classify_sqlx_error, DbPool};
use crate::error::Result;
use crate::execution::executor::SqlExecutor;
use crate::execution::result::RawResultSet;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::BigDecimal;
use sqlx::{Column, Executor, Row, TypeInfo};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Date functions the model is told to use; all are native to PostgreSQL.
pub const DATE_FUNCTIONS: &[&str] = &["date_trunc", "make_date", "EXTRACT", "CURRENT_DATE"];

pub struct PgExecutor {
    pool: DbPool,
}

impl PgExecutor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl PgExecutor {
    /// Column names of a statement that returned no rows, taken from the
    /// prepared statement description.
    async fn describe_columns(&self, sql: &str) -> Vec<String> {
        match (&self.pool).describe(sql).await {
            Ok(described) => described
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            Err(e) => {
                warn!(error = %e, "could not describe empty result columns");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn execute(&self, sql: &str) -> Result<RawResultSet> {
        let start = Instant::now();
        debug!(%sql, "executing generated SQL");

        let rows: Vec<PgRow> = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(classify_sqlx_error)?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => self.describe_columns(sql).await,
        };

        let values = rows
            .iter()
            .map(|row| (0..row.len()).map(|idx| decode_cell(row, idx)).collect())
            .collect();

        info!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "query executed"
        );

        Ok(RawResultSet::new(columns, values))
    }
}

/// Decode one cell by its Postgres type name. Types without a mapping are
/// attempted as text and otherwise reported as `null`.
fn decode_cell(row: &PgRow, idx: usize) -> Value {
    let type_name = row.column(idx).type_info().name().to_uppercase();

    match type_name.as_str() {
        "BOOL" => to_json(row.try_get::<Option<bool>, _>(idx)),
        "INT2" => to_json(row.try_get::<Option<i16>, _>(idx)),
        "INT4" => to_json(row.try_get::<Option<i32>, _>(idx)),
        "INT8" => to_json(row.try_get::<Option<i64>, _>(idx)),
        "FLOAT4" => to_json(row.try_get::<Option<f32>, _>(idx)),
        "FLOAT8" => to_json(row.try_get::<Option<f64>, _>(idx)),
        "NUMERIC" => match row.try_get::<Option<BigDecimal>, _>(idx) {
            Ok(Some(d)) => numeric_to_json(&d),
            _ => Value::Null,
        },
        "DATE" => to_json(
            row.try_get::<Option<NaiveDate>, _>(idx)
                .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string())),
        ),
        "TIME" => to_json(
            row.try_get::<Option<NaiveTime>, _>(idx)
                .map(|t| t.map(|t| t.format("%H:%M:%S").to_string())),
        ),
        "TIMESTAMP" => to_json(
            row.try_get::<Option<NaiveDateTime>, _>(idx)
                .map(|t| t.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())),
        ),
        "TIMESTAMPTZ" => to_json(
            row.try_get::<Option<DateTime<Utc>>, _>(idx)
                .map(|t| t.map(|t| t.to_rfc3339())),
        ),
        "UUID" => to_json(
            row.try_get::<Option<uuid::Uuid>, _>(idx)
                .map(|u| u.map(|u| u.to_string())),
        ),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(idx)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        _ => to_json(row.try_get::<Option<String>, _>(idx)),
    }
}

fn to_json<T: Into<Value>>(decoded: std::result::Result<Option<T>, sqlx::Error>) -> Value {
    match decoded {
        Ok(Some(v)) => v.into(),
        _ => Value::Null,
    }
}

/// Money and ratio columns arrive as NUMERIC; emit them as JSON numbers when
/// they fit in an f64, otherwise as their exact decimal text.
fn numeric_to_json(d: &BigDecimal) -> Value {
    let text = d.to_string();
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_numeric_to_json() {
        let d = BigDecimal::from_str("1234.50").unwrap();
        assert_eq!(numeric_to_json(&d), serde_json::json!(1234.5));
    }

    #[test]
    fn test_to_json_maps_null_and_errors() {
        assert_eq!(to_json::<i64>(Ok(None)), Value::Null);
        assert_eq!(to_json::<i64>(Err(sqlx::Error::RowNotFound)), Value::Null);
        assert_eq!(to_json(Ok(Some(7i64))), serde_json::json!(7));
    }
}
