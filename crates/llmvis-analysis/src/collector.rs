//! Positional correlation of stage outcomes with planned jobs.

use llmvis_core::JobSpec;

use crate::error::AnalysisError;
use crate::stage::StageOutcome;

/// What the pipeline produced for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Prompt actually sent to the query backend, after any translation.
    pub prompt_text: String,
    pub outcome: StageOutcome<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessfulJob {
    pub job: JobSpec,
    pub prompt_text: String,
    pub response_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedResults {
    /// Successful jobs in planning order.
    pub successes: Vec<SuccessfulJob>,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Pairs `results[i]` with `jobs[i]` and keeps the successes.
///
/// # Errors
///
/// Returns [`AnalysisError::OutcomeMismatch`] if the two lists differ in
/// length, since positions would no longer line up.
pub fn collect(jobs: &[JobSpec], results: Vec<JobResult>) -> Result<CollectedResults, AnalysisError> {
    if jobs.len() != results.len() {
        return Err(AnalysisError::OutcomeMismatch {
            jobs: jobs.len(),
            outcomes: results.len(),
        });
    }

    let successes: Vec<SuccessfulJob> = jobs
        .iter()
        .zip(results)
        .filter_map(|(job, result)| {
            let JobResult {
                prompt_text,
                outcome,
            } = result;
            outcome.into_payload().map(|response_text| SuccessfulJob {
                job: job.clone(),
                prompt_text,
                response_text,
            })
        })
        .collect();

    let total = jobs.len();
    let successful = successes.len();
    Ok(CollectedResults {
        successes,
        total,
        successful,
        failed: total - successful,
    })
}
