//! Cartesian expansion of a request into an ordered job list.
//!
//! Iteration order, outermost first: region, language, prompt template,
//! keyword, model. Every later stage correlates outcomes with jobs by index
//! into this list, so the order is part of the contract.

use llmvis_core::{JobSpec, ValidatedRequest, KEYWORD_PLACEHOLDER};

/// Substitutes every `{keyword}` placeholder in `template`.
#[must_use]
pub fn render_prompt(template: &str, keyword: &str) -> String {
    template.replace(KEYWORD_PLACEHOLDER, keyword)
}

/// Expands five dimension lists into one job per combination.
///
/// An empty list in any dimension yields no jobs.
#[must_use]
pub fn plan_jobs(
    regions: &[String],
    languages: &[String],
    prompt_templates: &[String],
    keywords: &[String],
    models: &[String],
) -> Vec<JobSpec> {
    let capacity =
        regions.len() * languages.len() * prompt_templates.len() * keywords.len() * models.len();
    let mut jobs = Vec::with_capacity(capacity);

    for region in regions {
        for language in languages {
            for template in prompt_templates {
                for keyword in keywords {
                    let prompt_text = render_prompt(template, keyword);
                    for model in models {
                        jobs.push(JobSpec {
                            model: model.clone(),
                            keyword: keyword.clone(),
                            language_code: language.clone(),
                            region: region.clone(),
                            prompt_template: template.clone(),
                            prompt_text: prompt_text.clone(),
                        });
                    }
                }
            }
        }
    }

    jobs
}

#[must_use]
pub fn plan_request(request: &ValidatedRequest) -> Vec<JobSpec> {
    plan_jobs(
        &request.regions,
        &request.languages,
        &request.prompt_templates,
        &request.keywords,
        &request.models,
    )
}
