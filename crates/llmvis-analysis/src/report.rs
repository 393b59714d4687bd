//! Turns collected successes into a persistable report.

use llmvis_core::{NewReport, NewResponseRecord, ValidatedRequest};

use crate::collector::SuccessfulJob;
use crate::kpi::{summarize, KpiAggregator};

/// Builds the report record: one response per success, each scored once,
/// plus the ungrouped summary over all of them.
#[must_use]
pub fn assemble_report(
    request: &ValidatedRequest,
    owner: Option<String>,
    successes: Vec<SuccessfulJob>,
) -> NewReport {
    let aggregator = KpiAggregator::new(&request.brand_name, &request.competitor_names);

    let responses: Vec<NewResponseRecord> = successes
        .into_iter()
        .map(|success| {
            let kpis = aggregator.compute(&success.response_text);
            let SuccessfulJob {
                job,
                prompt_text,
                response_text,
            } = success;
            NewResponseRecord {
                model: job.model,
                keyword: job.keyword,
                language_code: job.language_code,
                region: job.region,
                prompt_template: job.prompt_template,
                prompt_text,
                response_text,
                kpis,
            }
        })
        .collect();

    let kpis = summarize(
        responses.iter().map(|r| &r.kpis),
        &request.competitor_names,
    );

    NewReport {
        brand_name: request.brand_name.clone(),
        competitor_names: request.competitor_names.clone(),
        owner,
        models: request.models.clone(),
        keywords: request.keywords.clone(),
        regions: request.regions.clone(),
        languages: request.languages.clone(),
        prompt_templates: request.prompt_templates.clone(),
        kpis,
        responses,
    }
}

#[cfg(test)]
mod tests {
    use llmvis_core::JobSpec;

    use super::*;

    fn request() -> ValidatedRequest {
        ValidatedRequest {
            brand_name: "Acme".to_string(),
            competitor_names: vec!["Globex".to_string()],
            models: vec!["gpt-4".to_string()],
            keywords: vec!["rockets".to_string()],
            regions: vec!["Global".to_string()],
            languages: vec!["fr".to_string()],
            prompt_templates: vec!["About {keyword}".to_string()],
        }
    }

    fn success(response_text: &str) -> SuccessfulJob {
        SuccessfulJob {
            job: JobSpec {
                model: "gpt-4".to_string(),
                keyword: "rockets".to_string(),
                language_code: "fr".to_string(),
                region: "Global".to_string(),
                prompt_template: "About {keyword}".to_string(),
                prompt_text: "About rockets".to_string(),
            },
            prompt_text: "À propos des fusées".to_string(),
            response_text: response_text.to_string(),
        }
    }

    #[test]
    fn records_keep_sent_prompt_and_scores() {
        let report = assemble_report(
            &request(),
            Some("alice".to_string()),
            vec![success("Acme at https://acme.example"), success("Globex")],
        );

        assert_eq!(report.owner.as_deref(), Some("alice"));
        assert_eq!(report.responses.len(), 2);
        assert_eq!(report.responses[0].prompt_text, "À propos des fusées");
        assert_eq!(report.responses[0].prompt_template, "About {keyword}");
        assert!(report.responses[0].kpis.brand_citation_with_link);
        assert_eq!(
            report.responses[1].kpis.competitor_mentions.get("Globex"),
            Some(&true)
        );
        assert_eq!(report.kpis.total_responses, 2);
        assert_eq!(report.kpis.brand_mentions, 1);
        assert_eq!(report.languages, vec!["fr".to_string()]);
    }
}
