//! `analyze` command: build a request from flags or a YAML file and run it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use llmvis_analysis::Pipeline;
use llmvis_clients::{QueryClient, TranslationClient};
use llmvis_core::{AnalyzeRequest, AppConfig};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// YAML file holding the full request; replaces the dimension flags
    #[arg(
        long,
        conflicts_with_all = [
            "brand", "competitors", "models", "keywords", "regions", "languages", "templates",
        ]
    )]
    pub file: Option<PathBuf>,
    /// Brand to measure
    #[arg(long, required_unless_present = "file")]
    pub brand: Option<String>,
    /// Competitor names (repeat or comma-separate)
    #[arg(long = "competitor", value_delimiter = ',')]
    pub competitors: Vec<String>,
    /// Models to query
    #[arg(long = "model", value_delimiter = ',')]
    pub models: Vec<String>,
    /// Keywords substituted into each prompt template
    #[arg(long = "keyword", value_delimiter = ',')]
    pub keywords: Vec<String>,
    /// Regions; defaults to Global
    #[arg(long = "region", value_delimiter = ',')]
    pub regions: Vec<String>,
    /// Target language codes; defaults to no translation
    #[arg(long = "language", value_delimiter = ',')]
    pub languages: Vec<String>,
    /// Prompt templates containing `{keyword}`
    #[arg(long = "template")]
    pub templates: Vec<String>,
    /// Owner recorded on the report
    #[arg(long)]
    pub owner: Option<String>,
}

impl AnalyzeArgs {
    /// Builds the request from flags. Flags left out fall back to the
    /// request defaults.
    pub(crate) fn to_request(&self) -> AnalyzeRequest {
        fn optional(values: &[String]) -> Option<Vec<String>> {
            (!values.is_empty()).then(|| values.to_vec())
        }

        AnalyzeRequest {
            brand_name: self.brand.clone().unwrap_or_default(),
            competitor_names: optional(&self.competitors),
            models: self.models.clone(),
            keywords: self.keywords.clone(),
            regions: optional(&self.regions),
            languages: optional(&self.languages),
            prompt_templates: optional(&self.templates),
        }
    }
}

pub(crate) fn parse_request_yaml(raw: &str) -> anyhow::Result<AnalyzeRequest> {
    serde_yaml::from_str(raw).context("invalid analysis request YAML")
}

fn load_request(args: &AnalyzeArgs) -> anyhow::Result<AnalyzeRequest> {
    match &args.file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_request_yaml(&raw)
        }
        None => Ok(args.to_request()),
    }
}

/// Runs one analysis batch end to end and prints the summary.
///
/// # Errors
///
/// Returns an error if the request is invalid, every query fails, the batch
/// times out, or the report cannot be stored.
pub(crate) async fn run_analyze(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: AnalyzeArgs,
) -> anyhow::Result<()> {
    let validated = load_request(&args)?.validate()?;
    tracing::debug!(
        owner = args.owner.as_deref().unwrap_or("-"),
        translation_width = config.translation.max_concurrency,
        query_width = config.query.max_concurrency,
        "starting analysis"
    );
    println!(
        "analyzing '{}' across {} job(s)",
        validated.brand_name,
        validated.job_count()
    );

    let translator = TranslationClient::new(
        &config.translation_service_url,
        config.client_timeout_secs,
        &config.client_user_agent,
    )?;
    let querier = QueryClient::new(
        &config.llm_service_url,
        config.client_timeout_secs,
        &config.client_user_agent,
    )?;
    let pipeline = Pipeline::new(translator, querier, config.translation, config.query);

    let response = pipeline
        .analyze(pool, validated, args.owner, config.analysis_timeout())
        .await?;

    println!("report {} created", response.report_id);
    println!(
        "queries: {} total, {} succeeded, {} failed",
        response.total_queries, response.successful_queries, response.failed_queries
    );
    Ok(())
}
