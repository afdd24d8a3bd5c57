//! PostgreSQL executor tests against a live database.
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test postgres_test -- --ignored

use campaign_insights::db::init_pool;
use campaign_insights::execution::postgres::DATE_FUNCTIONS;
use campaign_insights::execution::{PgExecutor, QueryResult, SqlExecutor};
use serde_json::json;

async fn executor() -> PgExecutor {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/campaigns".to_string());
    let pool = init_pool(&url, 2, 1)
        .await
        .expect("Failed to connect to database");
    PgExecutor::new(pool)
}

#[tokio::test]
#[ignore] // Requires database
async fn test_empty_result_keeps_column_names() {
    let executor = executor().await;

    let raw = executor
        .execute("SELECT 1 AS impressions, 'Display'::text AS channel WHERE false")
        .await
        .unwrap();

    assert_eq!(raw.columns, vec!["impressions", "channel"]);
    assert!(raw.rows.is_empty());
    assert!(QueryResult::from_raw(raw).is_empty());
}

#[tokio::test]
#[ignore] // Requires database
async fn test_prompted_date_functions_run_on_postgres() {
    let executor = executor().await;
    let sql = "SELECT date_trunc('month', make_date(2024, 2, 29))::date AS month_start, \
               EXTRACT(YEAR FROM make_date(2024, 2, 29))::int AS year, \
               make_date(2024, 3, 1) - 1 AS day_before, \
               CURRENT_DATE - 7 <= CURRENT_DATE AS shifted";
    for function in DATE_FUNCTIONS {
        assert!(sql.contains(function), "query does not exercise {}", function);
    }

    let result = QueryResult::from_raw(executor.execute(sql).await.unwrap());

    let row = &result.rows()[0];
    assert_eq!(row["month_start"], json!("2024-02-01"));
    assert_eq!(row["year"], json!(2024));
    assert_eq!(row["day_before"], json!("2024-02-29"));
    assert_eq!(row["shifted"], json!(true));
}
