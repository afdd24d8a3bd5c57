use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    /// The executor could not obtain a database connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The database rejected or failed to run the statement.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The language-model client failed or returned an unusable response.
    #[error("LLM client error: {0}")]
    ClientError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audit log error: {0}")]
    Audit(String),

    #[error("Filter catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InsightError {
    /// Whether the error came from the SQL executor, i.e. the request can
    /// still be answered with a structured error payload.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            InsightError::ConnectionFailed(_) | InsightError::ExecutionFailed(_)
        )
    }

    /// The underlying message without the kind prefix added by `Display`.
    pub fn detail(&self) -> String {
        match self {
            InsightError::ConnectionFailed(msg)
            | InsightError::ExecutionFailed(msg)
            | InsightError::ClientError(msg)
            | InsightError::Config(msg)
            | InsightError::Audit(msg)
            | InsightError::Catalog(msg) => msg.clone(),
            InsightError::Io(e) => e.to_string(),
            InsightError::Json(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_drops_kind_prefix() {
        let err = InsightError::ExecutionFailed("column \"spnd\" does not exist".to_string());
        assert_eq!(err.to_string(), "Execution failed: column \"spnd\" does not exist");
        assert_eq!(err.detail(), "column \"spnd\" does not exist");
    }
}
