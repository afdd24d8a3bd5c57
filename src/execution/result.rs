//! Query Result - rows materialized from an executor's raw result set

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rows returned to the caller. The full result set is only used for the
/// summary prompt and the audit row count.
pub const DISPLAY_ROW_LIMIT: usize = 25;

/// One result row: column name to scalar value, in result-set column order.
pub type Row = Map<String, Value>;

/// Column names and positional values as produced by a SQL executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RawResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }
}

/// Materialized result of one generated query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    rows: Vec<Row>,
}

impl QueryResult {
    /// Zip every raw row with the column names.
    ///
    /// Missing trailing values become `null`; surplus values are dropped. A
    /// repeated column name keeps its first position and the last value.
    pub fn from_raw(raw: RawResultSet) -> Self {
        let RawResultSet { columns, rows } = raw;
        let rows = rows
            .into_iter()
            .map(|values| {
                let mut values = values.into_iter();
                let mut row = Row::with_capacity(columns.len());
                for column in &columns {
                    row.insert(column.clone(), values.next().unwrap_or(Value::Null));
                }
                row
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Size of the full result set.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `limit` rows for presentation.
    pub fn preview(&self, limit: usize) -> Vec<Row> {
        self.rows.iter().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_follow_column_order() {
        let raw = RawResultSet::new(
            vec!["total_spend".to_string(), "channel".to_string()],
            vec![vec![json!(10.5), json!("Display")]],
        );
        let result = QueryResult::from_raw(raw);
        let keys: Vec<&String> = result.rows()[0].keys().collect();
        assert_eq!(keys, vec!["total_spend", "channel"]);
        assert_eq!(
            serde_json::to_string(&result.rows()[0]).unwrap(),
            r#"{"total_spend":10.5,"channel":"Display"}"#
        );
    }

    #[test]
    fn test_short_rows_padded_with_null() {
        let raw = RawResultSet::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![json!(1)], vec![json!(1), json!(2), json!(3)]],
        );
        let result = QueryResult::from_raw(raw);
        assert_eq!(result.rows()[0]["b"], Value::Null);
        assert_eq!(result.rows()[1].len(), 2);
    }

    #[test]
    fn test_preview_truncates_but_count_is_full() {
        let raw = RawResultSet::new(
            vec!["n".to_string()],
            (0..40).map(|i| vec![json!(i)]).collect(),
        );
        let result = QueryResult::from_raw(raw);
        assert_eq!(result.row_count(), 40);
        let preview = result.preview(DISPLAY_ROW_LIMIT);
        assert_eq!(preview.len(), DISPLAY_ROW_LIMIT);
        assert_eq!(preview[24]["n"], json!(24));
    }

    #[test]
    fn test_empty_result() {
        let result = QueryResult::from_raw(RawResultSet::new(vec!["n".to_string()], vec![]));
        assert!(result.is_empty());
        assert!(result.preview(DISPLAY_ROW_LIMIT).is_empty());
    }
}
