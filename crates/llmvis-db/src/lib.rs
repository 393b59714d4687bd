//! Postgres persistence for analysis reports and their per-job responses.

pub mod pool;
pub mod reports;
pub mod responses;

use thiserror::Error;

pub use pool::{connect_pool, health_check, run_migrations, PoolConfig};
pub use reports::{
    delete_report, get_report, insert_report, list_reports, ReportListRow, ReportRow,
};
pub use responses::{count_responses, get_response, list_responses, ResponseRow};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}
