//! Campaign Insights: natural-language questions over campaign performance data.
//!
//! A question is sanitized, turned into SQL by a language model, executed,
//! summarized and audited; known filter values and date ranges are extracted
//! from the question for the dashboard.

pub mod audit;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod execution;
pub mod filters;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod sanitize;
pub mod time;

pub use error::{InsightError, Result};
pub use pipeline::{InsightPipeline, PipelineResponse};
