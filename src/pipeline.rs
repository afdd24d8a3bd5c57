//! Question answering pipeline
//!
//! One pass per request: sanitize, generate SQL, execute, summarize, audit,
//! extract filters. Only executor failures produce a structured error
//! response; a failed SQL generation is returned as `Err` for the transport
//! to surface. Nothing after a successful execution can fail the response.

use crate::audit::{AuditLog, AuditRecord};
use crate::error::Result;
use crate::execution::{QueryResult, Row, SqlExecutor, DISPLAY_ROW_LIMIT};
use crate::filters::{ExtractedFilters, FilterCatalog, FilterExtractor};
use crate::llm::{CompletionOptions, LanguageModel};
use crate::prompt::{build_sql_prompt, build_summary_prompt, SCHEMA_DESCRIPTION};
use crate::sanitize::{sanitize_query, truncate_chars};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const NO_QUERY_ERROR: &str = "No query provided.";
pub const EXECUTION_FAILED_SUMMARY: &str = "The query could not be executed. Please rephrase or simplify.";
pub const SUMMARY_UNAVAILABLE: &str = "A summary could not be generated for these results.";

/// Longest database error message echoed back to the caller.
pub const MAX_ERROR_CHARS: usize = 300;

/// Response body for one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineResponse {
    Answered {
        query: String,
        sql: String,
        summary: String,
        rows: Vec<Row>,
        filters: ExtractedFilters,
    },
    ExecutionFailed {
        query: String,
        sql: String,
        error: String,
        summary: String,
    },
    NoQuery {
        error: String,
    },
}

pub struct InsightPipeline {
    llm: Arc<dyn LanguageModel>,
    executor: Arc<dyn SqlExecutor>,
    audit: Arc<dyn AuditLog>,
    extractor: FilterExtractor,
    schema: String,
    audit_user: String,
}

impl InsightPipeline {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        executor: Arc<dyn SqlExecutor>,
        audit: Arc<dyn AuditLog>,
        catalog: Arc<FilterCatalog>,
    ) -> Self {
        Self {
            llm,
            executor,
            audit,
            extractor: FilterExtractor::new(catalog),
            schema: SCHEMA_DESCRIPTION.to_string(),
            audit_user: crate::config::DEFAULT_AUDIT_USER.to_string(),
        }
    }

    /// Identity recorded on audit records.
    pub fn with_audit_user(mut self, user: impl Into<String>) -> Self {
        self.audit_user = user.into();
        self
    }

    /// Replace the schema description shown to the model.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn extractor(&self) -> &FilterExtractor {
        &self.extractor
    }

    /// Answer a question relative to the local calendar date.
    pub async fn answer(&self, raw_query: &str) -> Result<PipelineResponse> {
        self.answer_on(raw_query, Local::now().date_naive()).await
    }

    /// Answer a question with `today` as the reference date for relative
    /// date phrases and the data-freshness note.
    pub async fn answer_on(&self, raw_query: &str, today: NaiveDate) -> Result<PipelineResponse> {
        let span = info_span!("pipeline", request_id = %Uuid::new_v4());
        self.run(raw_query, today).instrument(span).await
    }

    async fn run(&self, raw_query: &str, today: NaiveDate) -> Result<PipelineResponse> {
        let query = sanitize_query(raw_query);
        if query.is_empty() {
            info!("rejecting empty question");
            return Ok(PipelineResponse::NoQuery {
                error: NO_QUERY_ERROR.to_string(),
            });
        }
        info!(%query, "answering question");

        let sql = self.generate_sql(&query, today).await?;

        let raw = match self.executor.execute(&sql).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(executor = self.executor.name(), error = %e, "generated SQL failed to execute");
                return Ok(PipelineResponse::ExecutionFailed {
                    query,
                    sql,
                    error: truncate_chars(&e.detail(), MAX_ERROR_CHARS).to_string(),
                    summary: EXECUTION_FAILED_SUMMARY.to_string(),
                });
            }
        };
        let result = QueryResult::from_raw(raw);
        info!(rows = result.row_count(), "query returned");

        let summary = self.summarize(&query, &sql, &result).await;

        let record = AuditRecord::new(
            query.as_str(),
            sql.as_str(),
            result.row_count(),
            &summary,
            self.audit_user.as_str(),
        );
        if let Err(e) = self.audit.append(&record).await {
            warn!(error = %e, "audit log write failed");
        }

        let filters = self.extractor.extract(&query, today);
        debug!(fields = filters.len(), "filters extracted");

        Ok(PipelineResponse::Answered {
            query,
            sql,
            summary,
            rows: result.preview(DISPLAY_ROW_LIMIT),
            filters,
        })
    }

    /// Ask the model for one SQL statement answering `question`.
    pub async fn generate_sql(&self, question: &str, today: NaiveDate) -> Result<String> {
        let prompt = build_sql_prompt(&self.schema, question, today);
        let text = self
            .llm
            .complete(&prompt, &CompletionOptions::sql_generation())
            .await?;
        let sql = strip_code_fences(&text);
        debug!(%sql, "generated SQL");
        Ok(sql)
    }

    async fn summarize(&self, query: &str, sql: &str, result: &QueryResult) -> String {
        let prompt = build_summary_prompt(query, sql, result.rows());
        match self.llm.complete(&prompt, &CompletionOptions::summarization()).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "summarization failed, using fallback summary");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Trim model output and drop one surrounding markdown code fence, if any.
/// Whatever follows the opening fence on its line is a language tag.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let inner = match trimmed.strip_prefix("```") {
        Some(rest) => rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest),
        None => trimmed,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim().to_string()
}
