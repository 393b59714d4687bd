//! Visibility metrics: per-response flags and group aggregates.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use llmvis_core::{GroupDimension, KpiSummary, NewResponseRecord, ResponseKpis, UNKNOWN_BUCKET};
use llmvis_db::ResponseRow;
use regex::Regex;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhttps?://\S+").expect("valid regex"));

/// Computes [`ResponseKpis`] for one brand and its competitors.
///
/// Matching is a case-insensitive substring test; presence is boolean, so
/// repeated mentions in one response count once.
#[derive(Debug, Clone)]
pub struct KpiAggregator {
    brand: String,
    /// `(original name, lowercased name)`
    competitors: Vec<(String, String)>,
}

impl KpiAggregator {
    #[must_use]
    pub fn new(brand_name: &str, competitor_names: &[String]) -> Self {
        Self {
            brand: brand_name.to_lowercase(),
            competitors: competitor_names
                .iter()
                .map(|name| (name.clone(), name.to_lowercase()))
                .collect(),
        }
    }

    #[must_use]
    pub fn compute(&self, response_text: &str) -> ResponseKpis {
        let haystack = response_text.to_lowercase();
        let brand_mentioned = !self.brand.is_empty() && haystack.contains(&self.brand);
        let brand_citation_with_link = brand_mentioned && URL_PATTERN.is_match(response_text);

        let competitor_mentions = self
            .competitors
            .iter()
            .map(|(name, needle)| {
                (
                    name.clone(),
                    !needle.is_empty() && haystack.contains(needle.as_str()),
                )
            })
            .collect();

        ResponseKpis {
            brand_mentioned,
            brand_citation_with_link,
            competitor_mentions,
        }
    }
}

/// Anything carrying per-response KPIs and the five dimension values.
pub trait KpiSource {
    fn kpis(&self) -> &ResponseKpis;
    fn dimension_value(&self, dimension: GroupDimension) -> &str;
}

impl KpiSource for NewResponseRecord {
    fn kpis(&self) -> &ResponseKpis {
        &self.kpis
    }

    fn dimension_value(&self, dimension: GroupDimension) -> &str {
        self.dimension(dimension)
    }
}

impl KpiSource for ResponseRow {
    fn kpis(&self) -> &ResponseKpis {
        &self.kpis.0
    }

    fn dimension_value(&self, dimension: GroupDimension) -> &str {
        self.dimension(dimension)
    }
}

/// Aggregates a set of per-response KPIs.
///
/// Every name in `competitor_names` appears in the result, with a zero count
/// when nobody mentioned it.
pub fn summarize<'a, I>(kpis: I, competitor_names: &[String]) -> KpiSummary
where
    I: IntoIterator<Item = &'a ResponseKpis>,
{
    let mut summary = KpiSummary {
        competitor_mention_counts: competitor_names
            .iter()
            .map(|name| (name.clone(), 0))
            .collect(),
        ..KpiSummary::default()
    };

    for response in kpis {
        summary.total_responses += 1;
        summary.brand_mentions += u64::from(response.brand_mentioned);
        summary.brand_citation_with_link_count += u64::from(response.brand_citation_with_link);
        for (name, mentioned) in &response.competitor_mentions {
            *summary
                .competitor_mention_counts
                .entry(name.clone())
                .or_insert(0) += u64::from(*mentioned);
        }
    }

    let competitor_total: u64 = summary.competitor_mention_counts.values().sum();
    summary.brand_mention_percentage = percentage(summary.brand_mentions, summary.total_responses);
    summary.share_of_voice = percentage(
        summary.brand_mentions,
        summary.brand_mentions + competitor_total,
    );
    summary.citation_rate = percentage(
        summary.brand_citation_with_link_count,
        summary.total_responses,
    );
    summary
}

/// Partitions `records` by `dimension` and summarizes each bucket.
///
/// Blank dimension values land in [`UNKNOWN_BUCKET`]. Bucket totals sum to
/// the ungrouped total over the same records.
pub fn group_by<R: KpiSource>(
    records: &[R],
    dimension: GroupDimension,
    competitor_names: &[String],
) -> BTreeMap<String, KpiSummary> {
    let mut buckets: BTreeMap<String, Vec<&ResponseKpis>> = BTreeMap::new();
    for record in records {
        let value = record.dimension_value(dimension).trim();
        let key = if value.is_empty() {
            UNKNOWN_BUCKET
        } else {
            value
        };
        buckets.entry(key.to_string()).or_default().push(record.kpis());
    }

    buckets
        .into_iter()
        .map(|(key, kpis)| (key, summarize(kpis, competitor_names)))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    100.0 * numerator as f64 / denominator as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn competitors() -> Vec<String> {
        vec!["Globex".to_string(), "Initech".to_string()]
    }

    fn record(model: &str, region: &str, text: &str) -> NewResponseRecord {
        let aggregator = KpiAggregator::new("Acme", &competitors());
        NewResponseRecord {
            model: model.to_string(),
            keyword: "rockets".to_string(),
            language_code: "default".to_string(),
            region: region.to_string(),
            prompt_template: "{keyword}".to_string(),
            prompt_text: "rockets".to_string(),
            response_text: text.to_string(),
            kpis: aggregator.compute(text),
        }
    }

    #[test]
    fn brand_with_link_is_a_citation() {
        let kpis = KpiAggregator::new("Acme", &[]).compute("Acme is great, visit http://acme.com");
        assert!(kpis.brand_mentioned);
        assert!(kpis.brand_citation_with_link);
    }

    #[test]
    fn unrelated_text_mentions_nothing() {
        let kpis = KpiAggregator::new("Acme", &competitors()).compute("no relation here");
        assert!(!kpis.brand_mentioned);
        assert!(!kpis.brand_citation_with_link);
        assert!(kpis.competitor_mentions.values().all(|m| !m));
        assert_eq!(kpis.competitor_mentions.len(), 2);
    }

    #[test]
    fn matching_ignores_case() {
        let kpis = KpiAggregator::new("Acme", &competitors()).compute("ACME and globex");
        assert!(kpis.brand_mentioned);
        assert_eq!(kpis.competitor_mentions.get("Globex"), Some(&true));
        assert_eq!(kpis.competitor_mentions.get("Initech"), Some(&false));
    }

    #[test]
    fn link_without_brand_is_not_a_citation() {
        let kpis = KpiAggregator::new("Acme", &[]).compute("see https://globex.example");
        assert!(!kpis.brand_citation_with_link);
    }

    #[test]
    fn non_http_schemes_are_not_links() {
        let kpis = KpiAggregator::new("Acme", &[]).compute("Acme: ftp://acme.example");
        assert!(kpis.brand_mentioned);
        assert!(!kpis.brand_citation_with_link);
    }

    #[test]
    fn repeated_competitor_mentions_count_once() {
        let records = vec![record("m", "Global", "Globex Globex Globex")];
        let summary = summarize(records.iter().map(|r| &r.kpis), &competitors());
        assert_eq!(summary.competitor_mention_counts.get("Globex"), Some(&1));
    }

    #[test]
    fn summary_formulas() {
        let records = vec![
            record("m", "Global", "Acme http://acme.com"),
            record("m", "Global", "Acme and Globex"),
            record("m", "Global", "Globex"),
            record("m", "Global", "nothing"),
        ];
        let summary = summarize(records.iter().map(|r| &r.kpis), &competitors());

        assert_eq!(summary.total_responses, 4);
        assert_eq!(summary.brand_mentions, 2);
        assert_eq!(summary.brand_citation_with_link_count, 1);
        assert_eq!(summary.competitor_mention_counts.get("Globex"), Some(&2));
        assert_eq!(summary.competitor_mention_counts.get("Initech"), Some(&0));
        assert!((summary.brand_mention_percentage - 50.0).abs() < f64::EPSILON);
        assert!((summary.share_of_voice - 50.0).abs() < f64::EPSILON);
        assert!((summary.citation_rate - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn share_of_voice_is_zero_without_mentions() {
        let records = vec![record("m", "Global", "nothing"), record("m", "Global", "nope")];
        let summary = summarize(records.iter().map(|r| &r.kpis), &competitors());
        assert!(summary.share_of_voice.abs() < f64::EPSILON);
        assert!(summary.brand_mention_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_set_has_zero_rates() {
        let summary = summarize(std::iter::empty::<&ResponseKpis>(), &competitors());
        assert_eq!(summary.total_responses, 0);
        assert!(summary.citation_rate.abs() < f64::EPSILON);
        assert!(summary.share_of_voice.abs() < f64::EPSILON);
    }

    #[test]
    fn citation_rate_never_exceeds_mention_percentage() {
        let texts = [
            "Acme https://a.example",
            "Acme",
            "https://x.example",
            "Globex https://g.example",
            "acme http://b.example",
        ];
        for n in 1..=texts.len() {
            let records: Vec<_> = texts[..n]
                .iter()
                .map(|t| record("m", "Global", t))
                .collect();
            let summary = summarize(records.iter().map(|r| &r.kpis), &competitors());
            assert!(summary.citation_rate <= summary.brand_mention_percentage);
        }
    }

    #[test]
    fn grouped_totals_sum_to_ungrouped() {
        let records = vec![
            record("gpt-4", "Global", "Acme http://acme.com"),
            record("llama", "France", "Globex"),
            record("gpt-4", "France", "Acme and Initech"),
            record("llama", "", "nothing"),
            record("mistral", "Global", "Acme Globex"),
        ];
        let overall = summarize(records.iter().map(|r| &r.kpis), &competitors());

        for dimension in GroupDimension::ALL {
            let groups = group_by(&records, dimension, &competitors());
            let total: u64 = groups.values().map(|g| g.total_responses).sum();
            let mentions: u64 = groups.values().map(|g| g.brand_mentions).sum();
            assert_eq!(total, overall.total_responses, "{dimension}");
            assert_eq!(mentions, overall.brand_mentions, "{dimension}");
            for name in competitors() {
                let grouped: u64 = groups
                    .values()
                    .map(|g| g.competitor_mention_counts[&name])
                    .sum();
                assert_eq!(grouped, overall.competitor_mention_counts[&name]);
            }
        }
    }

    #[test]
    fn blank_dimension_values_use_unknown_bucket() {
        let records = vec![
            record("gpt-4", "", "Acme"),
            record("gpt-4", "France", "Acme"),
        ];
        let groups = group_by(&records, GroupDimension::Region, &competitors());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[UNKNOWN_BUCKET].total_responses, 1);
        assert_eq!(groups["France"].total_responses, 1);
    }
}
