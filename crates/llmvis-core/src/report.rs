//! Records handed to the persistence layer once a batch has been aggregated.

use serde::{Deserialize, Serialize};

use crate::dimensions::GroupDimension;
use crate::kpis::{KpiSummary, ResponseKpis};

/// A successful job's response, ready to be stored under its report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResponseRecord {
    pub model: String,
    pub keyword: String,
    pub language_code: String,
    pub region: String,
    pub prompt_template: String,
    /// Prompt as actually sent, after any translation.
    pub prompt_text: String,
    pub response_text: String,
    pub kpis: ResponseKpis,
}

impl NewResponseRecord {
    #[must_use]
    pub fn dimension(&self, dimension: GroupDimension) -> &str {
        match dimension {
            GroupDimension::Region => &self.region,
            GroupDimension::Language => &self.language_code,
            GroupDimension::Model => &self.model,
            GroupDimension::Keyword => &self.keyword,
            GroupDimension::PromptTemplate => &self.prompt_template,
        }
    }
}

/// A report and everything it owns, written in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    pub brand_name: String,
    pub competitor_names: Vec<String>,
    pub owner: Option<String>,
    pub models: Vec<String>,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
    pub prompt_templates: Vec<String>,
    /// Ungrouped aggregate over `responses` at creation time.
    pub kpis: KpiSummary,
    pub responses: Vec<NewResponseRecord>,
}
