//! Batch brand-visibility analysis: plan jobs, run them through the
//! translation and query stages, aggregate KPIs, and persist the report.

pub mod backends;
pub mod collector;
pub mod error;
pub mod kpi;
pub mod pipeline;
pub mod planner;
pub mod report;
pub mod stage;

pub use backends::{QueryBackend, ReportStore, TranslationBackend};
pub use collector::{collect, CollectedResults, JobResult, SuccessfulJob};
pub use error::AnalysisError;
pub use kpi::{group_by, summarize, KpiAggregator, KpiSource};
pub use pipeline::Pipeline;
pub use planner::{plan_jobs, plan_request, render_prompt};
pub use report::assemble_report;
pub use stage::{backoff_delay, RetryPolicy, StageExecutor, StageOutcome};
