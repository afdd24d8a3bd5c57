//! Prompt construction for SQL generation and result summarization.
//!
//! Both builders are pure: the same schema, question and date always give the
//! same messages. The ordering inside the SQL prompt (instructions, schema,
//! worked example, notes, question) is relied on by the model and is covered
//! by tests.

use crate::execution::postgres::DATE_FUNCTIONS;
use crate::execution::result::Row;
use crate::llm::{ChatMessage, ChatPrompt};
use chrono::NaiveDate;

pub const SQL_SYSTEM_ROLE: &str = "You are a helpful SQL assistant.";

pub const SUMMARY_SYSTEM_ROLE: &str =
    "You are a marketing analytics assistant who explains query results in plain language.";

/// Schema of the campaign performance warehouse as shown to the model.
pub const SCHEMA_DESCRIPTION: &str = r#"Tables:
1. campaign_performance_recent: daily delivery for the last 13 months.
2. campaign_performance_historical: daily delivery older than 13 months.
Both tables share the same columns:
- report_date (DATE): day the delivery happened
- campaign_name (TEXT): campaign name as trafficked
- channel (TEXT): one of 'Paid Social', 'Paid Search', 'Display', 'Video', 'Video - Pre-Roll', 'Video - CTV', 'Audio', 'Native', 'Affiliate', 'Email'
- platform (TEXT): buying platform, one of 'Meta', 'Facebook', 'Instagram', 'TikTok', 'LinkedIn', 'Snapchat', 'Pinterest', 'Google Ads', 'Microsoft Ads', 'DV360', 'The Trade Desk', 'Amazon DSP', 'YouTube'
- publisher (TEXT): media owner, one of 'Google', 'Meta', 'Amazon', 'Hulu', 'Spotify', 'Pandora', 'Reddit', 'ESPN', 'CNN', 'New York Times'
- objective (TEXT): one of 'Awareness', 'Consideration', 'Conversion', 'Retargeting'
- impressions (BIGINT)
- clicks (BIGINT)
- video_views (BIGINT)
- video_completions (BIGINT)
- conversions (BIGINT)
- spend (NUMERIC(18,2)): media cost in USD
- revenue (NUMERIC(18,2)): attributed revenue in USD
Rows with no value for a categorical column store the literal 'None'."#;

const UNION_EXAMPLE: &str = r#"Example (a date range spanning both tables):
SELECT channel, SUM(spend) AS total_spend
FROM (
    SELECT channel, spend FROM campaign_performance_recent
    WHERE report_date BETWEEN '2023-01-01' AND '2024-12-31'
    UNION ALL
    SELECT channel, spend FROM campaign_performance_historical
    WHERE report_date BETWEEN '2023-01-01' AND '2024-12-31'
) AS combined
GROUP BY channel
ORDER BY total_spend DESC;"#;

const ACRONYM_NOTES: &str = r#"Acronyms:
- CTR = click-through rate = clicks / impressions
- CPC = cost per click = spend / clicks
- CPM = cost per thousand impressions = spend * 1000 / impressions
- CPA = cost per acquisition = spend / conversions
- CVR = conversion rate = conversions / clicks
- ROAS = return on ad spend = revenue / spend
- VCR = video completion rate = video_completions / video_views
Guard every ratio against division by zero with NULLIF."#;

/// Two-message prompt asking the model for a single SQL statement.
pub fn build_sql_prompt(schema: &str, question: &str, today: NaiveDate) -> ChatPrompt {
    let latest = today.pred_opt().unwrap_or(today).format("%Y-%m-%d");
    let date_functions = DATE_FUNCTIONS.join(", ");

    let task = format!(
        "Write a single valid SQL query that answers the question below. \
Return only the SQL statement: no explanation, no comments, no markdown code fences.

{schema}

When the requested dates may fall in both the recent and the historical table, \
combine them with UNION ALL as shown here:
{example}

{acronyms}

Notes:
- The most recent available data is for {latest} (yesterday). Today's data is never available; \
treat \"latest\", \"current\" and \"to date\" as ending on {latest}.
- The database is PostgreSQL. Do not use the INTERVAL keyword. Use the date functions {date_functions} \
for date arithmetic, and shift a date by adding or subtracting whole days (for example CURRENT_DATE - 7).
- Only reference the tables and columns listed above.

Question: {question}",
        schema = schema,
        example = UNION_EXAMPLE,
        acronyms = ACRONYM_NOTES,
        latest = latest,
        date_functions = date_functions,
        question = question,
    );

    vec![ChatMessage::system(SQL_SYSTEM_ROLE), ChatMessage::user(task)]
}

/// Prompt asking for a short narrative over the full result set.
pub fn build_summary_prompt(question: &str, sql: &str, rows: &[Row]) -> ChatPrompt {
    let rows_json = serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string());

    let task = format!(
        "A user asked: \"{question}\"

The following SQL was run:
{sql}

It returned {count} row(s):
{rows_json}

Summarize the answer to the user's question in two or three sentences. \
Mention the most important numbers. If no rows were returned, say that no matching data was found.",
        question = question,
        sql = sql,
        count = rows.len(),
        rows_json = rows_json,
    );

    vec![ChatMessage::system(SUMMARY_SYSTEM_ROLE), ChatMessage::user(task)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_sql_prompt_roles() {
        let prompt = build_sql_prompt(SCHEMA_DESCRIPTION, "spend by channel", today());
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, ChatRole::System);
        assert!(prompt[0].content.contains("helpful SQL assistant"));
        assert_eq!(prompt[1].role, ChatRole::User);
    }

    #[test]
    fn test_sql_prompt_section_order() {
        let prompt = build_sql_prompt(SCHEMA_DESCRIPTION, "top publishers by CTR", today());
        let user = &prompt[1].content;

        let instruction = user.find("Return only the SQL statement").unwrap();
        let schema = user.find("campaign_performance_recent").unwrap();
        let example = user.find("UNION ALL").unwrap();
        let acronyms = user.find("CTR = click-through rate").unwrap();
        let freshness = user.find("(yesterday)").unwrap();
        let interval = user.find("Do not use the INTERVAL keyword").unwrap();
        let question = user.find("Question: top publishers by CTR").unwrap();

        assert!(instruction < schema);
        assert!(schema < example);
        assert!(example < acronyms);
        assert!(acronyms < freshness);
        assert!(freshness < interval);
        assert!(interval < question);
        assert!(user.ends_with("Question: top publishers by CTR"));
    }

    #[test]
    fn test_freshness_is_yesterday() {
        let prompt = build_sql_prompt(SCHEMA_DESCRIPTION, "spend", today());
        // 2025-03-01 minus one day crosses the February boundary.
        assert!(prompt[1].content.contains("2025-02-28 (yesterday)"));
        assert!(!prompt[1].content.contains("2025-03-01"));
    }

    #[test]
    fn test_date_guidance_matches_postgres() {
        let prompt = build_sql_prompt(SCHEMA_DESCRIPTION, "spend last 7 days", today());
        let user = &prompt[1].content;
        for function in DATE_FUNCTIONS {
            assert!(user.contains(function), "missing {}", function);
        }
        for foreign in ["DATEADD", "DATEDIFF", "EOMONTH", "GETDATE", "dbo.", "NVARCHAR"] {
            assert!(!user.contains(foreign), "unexpected {}", foreign);
        }
    }

    #[test]
    fn test_sql_prompt_is_pure() {
        let a = build_sql_prompt(SCHEMA_DESCRIPTION, "clicks", today());
        let b = build_sql_prompt(SCHEMA_DESCRIPTION, "clicks", today());
        assert_eq!(a, b);
    }

    #[test]
    fn test_summary_prompt_includes_rows() {
        let mut row = Row::new();
        row.insert("channel".to_string(), json!("Display"));
        row.insert("total_spend".to_string(), json!(1250.5));
        let prompt = build_summary_prompt("spend by channel", "SELECT 1", &[row]);

        assert_eq!(prompt[0].role, ChatRole::System);
        let user = &prompt[1].content;
        assert!(user.contains("spend by channel"));
        assert!(user.contains("SELECT 1"));
        assert!(user.contains("1 row(s)"));
        assert!(user.contains(r#"{"channel":"Display","total_spend":1250.5}"#));
    }
}
