use anyhow::Result;
use campaign_insights::bootstrap::build_pipeline;
use campaign_insights::config::{init_tracing, AppConfig};
use campaign_insights::filters::{FilterCatalog, FilterExtractor};
use campaign_insights::sanitize::sanitize_query;
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "campaign-insights")]
#[command(about = "Answer natural-language questions about campaign performance")]
struct Args {
    /// The question in natural language
    question: String,

    /// Only extract filters and dates; no model or database calls
    #[arg(long)]
    filters_only: bool,

    /// Reference date for relative phrases (YYYY-MM-DD, default: today)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Pretty-print the JSON response
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("warn");

    let args = Args::parse();
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    info!(question = %args.question, %today, "campaign insights starting");

    let output = if args.filters_only {
        dotenv::dotenv().ok();
        let catalog = match std::env::var("FILTER_CATALOG_PATH") {
            Ok(path) => FilterCatalog::load(Path::new(&path))?,
            Err(_) => FilterCatalog::campaign_default(),
        };
        let extractor = FilterExtractor::new(Arc::new(catalog));
        let query = sanitize_query(&args.question);
        serde_json::to_value(extractor.extract(&query, today))?
    } else {
        let config = AppConfig::from_env()?;
        let pipeline = build_pipeline(&config).await?;
        serde_json::to_value(pipeline.answer_on(&args.question, today).await?)?
    };

    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", output);
    }

    Ok(())
}
