//! Shared domain types and configuration for the LLM visibility workspace.

pub mod analysis;
pub mod app_config;
pub mod config;
pub mod dimensions;
pub mod kpis;
pub mod report;

use thiserror::Error;

pub use analysis::{
    AnalyzeRequest, AnalyzeResponse, JobSpec, ValidatedRequest, ValidationError,
    DEFAULT_PROMPT_TEMPLATE, DEFAULT_REGION, KEYWORD_PLACEHOLDER, MAX_BRAND_NAME_LEN,
    MAX_KEYWORD_LEN, MAX_LANGUAGE_CODE_LEN, MAX_MODEL_LEN, MAX_REGION_LEN, NO_TRANSLATION,
};
pub use app_config::{AppConfig, Environment, StageConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use dimensions::{DimensionFilters, GroupDimension, UnknownDimension, UNKNOWN_BUCKET};
pub use kpis::{KpiSummary, ResponseKpis};
pub use report::{NewReport, NewResponseRecord};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
