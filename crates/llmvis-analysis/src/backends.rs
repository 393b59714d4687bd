//! Seams between the pipeline and its collaborators.
//!
//! Production wires the HTTP clients and the Postgres pool in; tests supply
//! in-memory fakes.

use std::fmt::Display;
use std::future::Future;

use llmvis_clients::{ClientError, QueryClient, TranslationClient};
use llmvis_core::NewReport;
use llmvis_db::DbError;
use sqlx::PgPool;

/// Translates prompt text. One call is one attempt.
pub trait TranslationBackend: Send + Sync {
    type Error: Display + Send;

    fn translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Sends a prompt to a text-generation model. One call is one attempt.
pub trait QueryBackend: Send + Sync {
    type Error: Display + Send;

    fn query(
        &self,
        model: &str,
        prompt: &str,
        region: Option<&str>,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Persists a report and its responses atomically, returning the report id.
pub trait ReportStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save_report(
        &self,
        report: &NewReport,
    ) -> impl Future<Output = Result<i64, Self::Error>> + Send;
}

impl TranslationBackend for TranslationClient {
    type Error = ClientError;

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ClientError> {
        TranslationClient::translate(self, text, target_language).await
    }
}

impl QueryBackend for QueryClient {
    type Error = ClientError;

    async fn query(
        &self,
        model: &str,
        prompt: &str,
        region: Option<&str>,
    ) -> Result<String, ClientError> {
        QueryClient::query(self, model, prompt, region).await
    }
}

impl ReportStore for PgPool {
    type Error = DbError;

    async fn save_report(&self, report: &NewReport) -> Result<i64, DbError> {
        llmvis_db::insert_report(self, report).await
    }
}
