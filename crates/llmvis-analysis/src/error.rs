use llmvis_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("all {total} queries failed")]
    AllQueriesFailed { total: usize },

    #[error("analysis did not complete within {secs}s")]
    Timeout { secs: u64 },

    #[error("{outcomes} outcomes returned for {jobs} jobs")]
    OutcomeMismatch { jobs: usize, outcomes: usize },

    #[error("failed to persist report: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}
