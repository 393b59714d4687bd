//! Batch orchestration.
//!
//! Jobs fan out through a `buffer_unordered` stream. Each job translates (if
//! needed) and then queries, taking permits from the stage it is in. Results
//! land in a slot indexed by job position, so completion order never leaks
//! into the output.

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use llmvis_core::{AnalyzeResponse, JobSpec, StageConfig, ValidatedRequest};

use crate::backends::{QueryBackend, ReportStore, TranslationBackend};
use crate::collector::{collect, JobResult};
use crate::error::AnalysisError;
use crate::planner::plan_request;
use crate::report::assemble_report;
use crate::stage::{StageExecutor, StageOutcome};

/// The two-stage job runner plus the collaborators it calls.
///
/// Built once per process; every batch shares the same permit pools.
#[derive(Debug)]
pub struct Pipeline<T, Q> {
    translator: T,
    querier: Q,
    translation: StageExecutor,
    query: StageExecutor,
}

impl<T, Q> Pipeline<T, Q>
where
    T: TranslationBackend,
    Q: QueryBackend,
{
    #[must_use]
    pub fn new(
        translator: T,
        querier: Q,
        translation_config: StageConfig,
        query_config: StageConfig,
    ) -> Self {
        Self {
            translator,
            querier,
            translation: StageExecutor::new("translation", translation_config),
            query: StageExecutor::new("query", query_config),
        }
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    pub fn querier(&self) -> &Q {
        &self.querier
    }

    /// Runs every job and returns one result per job, in job order.
    pub async fn run(&self, jobs: &[JobSpec]) -> Vec<JobResult> {
        let width = (self.translation.width() + self.query.width()).max(1);
        let mut slots: Vec<Option<JobResult>> = (0..jobs.len()).map(|_| None).collect();

        // Index-keyed so the stream future stays `Send` inside axum handlers.
        let mut completed = stream::iter(0..jobs.len())
            .map(|index| async move { (index, self.run_job(index, &jobs[index]).await) })
            .buffer_unordered(width);

        while let Some((index, result)) = completed.next().await {
            slots[index] = Some(result);
        }

        slots.into_iter().flatten().collect()
    }

    /// Runs an already-validated batch end to end under a single deadline.
    ///
    /// A timeout drops whatever is in flight, including an uncommitted
    /// persistence transaction.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::AllQueriesFailed`] if no job succeeded; nothing is
    ///   persisted.
    /// - [`AnalysisError::Timeout`] if the batch exceeds `timeout`.
    /// - [`AnalysisError::Persistence`] if the store rejects the report.
    pub async fn analyze<S: ReportStore>(
        &self,
        store: &S,
        request: ValidatedRequest,
        owner: Option<String>,
        timeout: Duration,
    ) -> Result<AnalyzeResponse, AnalysisError> {
        match tokio::time::timeout(timeout, self.analyze_inner(store, request, owner)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_secs = timeout.as_secs(),
                    "analysis batch timed out"
                );
                Err(AnalysisError::Timeout {
                    secs: timeout.as_secs(),
                })
            }
        }
    }

    async fn analyze_inner<S: ReportStore>(
        &self,
        store: &S,
        request: ValidatedRequest,
        owner: Option<String>,
    ) -> Result<AnalyzeResponse, AnalysisError> {
        let jobs = plan_request(&request);
        tracing::info!(
            brand = %request.brand_name,
            jobs = jobs.len(),
            translation_width = self.translation.width(),
            query_width = self.query.width(),
            "analysis batch started"
        );

        let results = self.run(&jobs).await;
        let collected = collect(&jobs, results)?;

        tracing::info!(
            brand = %request.brand_name,
            total = collected.total,
            successful = collected.successful,
            failed = collected.failed,
            "analysis batch finished"
        );

        if collected.successful == 0 {
            return Err(AnalysisError::AllQueriesFailed {
                total: collected.total,
            });
        }

        let report = assemble_report(&request, owner, collected.successes);
        let report_id = store.save_report(&report).await.map_err(|e| {
            tracing::error!(error = %e, brand = %request.brand_name, "failed to persist report");
            AnalysisError::Persistence(Box::new(e))
        })?;

        Ok(AnalyzeResponse {
            report_id,
            brand_name: request.brand_name,
            timestamp: Utc::now(),
            total_queries: collected.total,
            successful_queries: collected.successful,
            failed_queries: collected.failed,
        })
    }

    async fn run_job(&self, index: usize, job: &JobSpec) -> JobResult {
        let prompt_text = if job.needs_translation() {
            self.translate_prompt(index, job).await
        } else {
            job.prompt_text.clone()
        };

        let region = job.query_region();
        let outcome = self
            .query
            .execute(index, || self.querier.query(&job.model, &prompt_text, region))
            .await;

        if let StageOutcome::Failed { error, attempts } = &outcome {
            tracing::error!(
                job_index = index,
                model = %job.model,
                keyword = %job.keyword,
                region = %job.region,
                attempts,
                error = %error,
                "query failed; job excluded from report"
            );
        }

        JobResult {
            prompt_text,
            outcome,
        }
    }

    /// Falls back to the untranslated prompt when translation gives up.
    async fn translate_prompt(&self, index: usize, job: &JobSpec) -> String {
        let outcome = self
            .translation
            .execute(index, || {
                self.translator
                    .translate(&job.prompt_text, &job.language_code)
            })
            .await;

        match outcome {
            StageOutcome::Succeeded { payload, .. } => payload,
            StageOutcome::Failed { error, attempts } => {
                tracing::warn!(
                    job_index = index,
                    language_code = %job.language_code,
                    attempts,
                    error = %error,
                    "translation failed; using original prompt"
                );
                job.prompt_text.clone()
            }
        }
    }
}
