//! Visibility metric shapes shared by the pipeline, storage, and API layers.
//!
//! The arithmetic lives in `llmvis-analysis`; these types only carry values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metrics computed once from a single response text at ingestion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseKpis {
    pub brand_mentioned: bool,
    pub brand_citation_with_link: bool,
    /// Presence per competitor, not a count of occurrences.
    #[serde(default)]
    pub competitor_mentions: BTreeMap<String, bool>,
}

/// Metrics aggregated over a set of responses.
///
/// Percentages are in `[0, 100]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_responses: u64,
    pub brand_mentions: u64,
    pub brand_citation_with_link_count: u64,
    pub competitor_mention_counts: BTreeMap<String, u64>,
    pub brand_mention_percentage: f64,
    pub share_of_voice: f64,
    pub citation_rate: f64,
}
