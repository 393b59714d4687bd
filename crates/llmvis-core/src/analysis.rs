//! Batch analysis request, validation, and the per-job specification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Region used when the caller does not provide one. Never forwarded to the
/// query backend.
pub const DEFAULT_REGION: &str = "Global";

/// Language code meaning "send the prompt as written".
pub const NO_TRANSLATION: &str = "default";

/// Placeholder substituted with each keyword when expanding templates.
pub const KEYWORD_PLACEHOLDER: &str = "{keyword}";

/// Column widths of the stored report and response rows, in characters.
pub const MAX_BRAND_NAME_LEN: usize = 255;
pub const MAX_MODEL_LEN: usize = 255;
pub const MAX_KEYWORD_LEN: usize = 255;
pub const MAX_REGION_LEN: usize = 100;
pub const MAX_LANGUAGE_CODE_LEN: usize = 16;

pub const DEFAULT_PROMPT_TEMPLATE: &str =
    "What do you know about {keyword}? What brands come to your mind when you think of {keyword}?";

/// Inbound batch analysis request.
///
/// Optional dimensions that are omitted fall back to their defaults; a
/// dimension that is present but empty is rejected by [`AnalyzeRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub brand_name: String,
    #[serde(default)]
    pub competitor_names: Option<Vec<String>>,
    pub models: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub prompt_templates: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("brand_name must not be empty")]
    EmptyBrandName,

    #[error("{0} must contain at least one non-blank entry")]
    EmptyDimension(&'static str),

    #[error("{field} entries must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// A request whose dimensions are all non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRequest {
    pub brand_name: String,
    pub competitor_names: Vec<String>,
    pub models: Vec<String>,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
    pub prompt_templates: Vec<String>,
}

impl AnalyzeRequest {
    /// Applies defaults and rejects blank brand names, empty dimensions, and
    /// values wider than their stored columns.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first invalid field.
    pub fn validate(self) -> Result<ValidatedRequest, ValidationError> {
        let brand_name = self.brand_name.trim().to_string();
        if brand_name.is_empty() {
            return Err(ValidationError::EmptyBrandName);
        }
        fits("brand_name", std::slice::from_ref(&brand_name), MAX_BRAND_NAME_LEN)?;

        let models = required("models", self.models)?;
        fits("models", &models, MAX_MODEL_LEN)?;
        let keywords = required("keywords", self.keywords)?;
        fits("keywords", &keywords, MAX_KEYWORD_LEN)?;
        let regions = with_default("regions", self.regions, DEFAULT_REGION)?;
        fits("regions", &regions, MAX_REGION_LEN)?;
        let languages = with_default("languages", self.languages, NO_TRANSLATION)?;
        fits("languages", &languages, MAX_LANGUAGE_CODE_LEN)?;
        let prompt_templates = with_default(
            "prompt_templates",
            self.prompt_templates,
            DEFAULT_PROMPT_TEMPLATE,
        )?;

        let mut competitor_names: Vec<String> = Vec::new();
        for name in clean(self.competitor_names.unwrap_or_default()) {
            if !competitor_names.contains(&name) {
                competitor_names.push(name);
            }
        }

        Ok(ValidatedRequest {
            brand_name,
            competitor_names,
            models,
            keywords,
            regions,
            languages,
            prompt_templates,
        })
    }
}

impl ValidatedRequest {
    /// Number of jobs the planner will produce for this request.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.regions.len()
            * self.languages.len()
            * self.prompt_templates.len()
            * self.keywords.len()
            * self.models.len()
    }
}

fn clean(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn required(field: &'static str, values: Vec<String>) -> Result<Vec<String>, ValidationError> {
    let cleaned = clean(values);
    if cleaned.is_empty() {
        return Err(ValidationError::EmptyDimension(field));
    }
    Ok(cleaned)
}

fn fits(field: &'static str, values: &[String], max: usize) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.chars().count() > max) {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn with_default(
    field: &'static str,
    values: Option<Vec<String>>,
    default: &str,
) -> Result<Vec<String>, ValidationError> {
    match values {
        None => Ok(vec![default.to_string()]),
        Some(values) => required(field, values),
    }
}

/// One fully specified unit of work.
///
/// Built once by the planner and never mutated; jobs are correlated with
/// their outcomes by position only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub model: String,
    pub keyword: String,
    pub language_code: String,
    pub region: String,
    pub prompt_template: String,
    pub prompt_text: String,
}

impl JobSpec {
    #[must_use]
    pub fn needs_translation(&self) -> bool {
        self.language_code != NO_TRANSLATION
    }

    /// Region to forward to the query backend, if any.
    #[must_use]
    pub fn query_region(&self) -> Option<&str> {
        (self.region != DEFAULT_REGION).then_some(self.region.as_str())
    }
}

/// Envelope returned to the caller after a batch completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub report_id: i64,
    pub brand_name: String,
    pub timestamp: DateTime<Utc>,
    pub total_queries: usize,
    pub successful_queries: usize,
    pub failed_queries: usize,
}
