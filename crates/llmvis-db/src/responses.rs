//! Database operations for `llm_responses`.

use chrono::{DateTime, Utc};
use llmvis_core::{DimensionFilters, GroupDimension, ResponseKpis};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A stored response, one per successful job.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResponseRow {
    pub id: i64,
    pub report_id: i64,
    pub position: i32,
    pub model: String,
    pub keyword: String,
    pub language_code: String,
    pub region: String,
    pub prompt_template: String,
    pub prompt_text: String,
    pub response_text: String,
    pub kpis: Json<ResponseKpis>,
    pub created_at: DateTime<Utc>,
}

impl ResponseRow {
    #[must_use]
    pub fn dimension(&self, dimension: GroupDimension) -> &str {
        match dimension {
            GroupDimension::Region => &self.region,
            GroupDimension::Language => &self.language_code,
            GroupDimension::Model => &self.model,
            GroupDimension::Keyword => &self.keyword,
            GroupDimension::PromptTemplate => &self.prompt_template,
        }
    }
}

const FILTER_CLAUSE: &str = "report_id = $1 \
     AND ($2::TEXT IS NULL OR region = $2) \
     AND ($3::TEXT IS NULL OR language_code = $3) \
     AND ($4::TEXT IS NULL OR model = $4) \
     AND ($5::TEXT IS NULL OR keyword = $5) \
     AND ($6::TEXT IS NULL OR prompt_template = $6)";

/// Lists a report's responses in job order, narrowed by `filters`.
///
/// `limit = None` returns every matching row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_responses(
    pool: &PgPool,
    report_id: i64,
    filters: &DimensionFilters,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<ResponseRow>, DbError> {
    let sql = format!(
        "SELECT id, report_id, position, model, keyword, language_code, region, \
                prompt_template, prompt_text, response_text, kpis, created_at \
         FROM llm_responses \
         WHERE {FILTER_CLAUSE} \
         ORDER BY position \
         LIMIT $7 OFFSET $8"
    );

    // A NULL LIMIT means no limit in Postgres.
    let rows = sqlx::query_as::<_, ResponseRow>(&sql)
        .bind(report_id)
        .bind(filters.region.as_deref())
        .bind(filters.language_code.as_deref())
        .bind(filters.model.as_deref())
        .bind(filters.keyword.as_deref())
        .bind(filters.prompt_template.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Counts a report's responses that match `filters`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_responses(
    pool: &PgPool,
    report_id: i64,
    filters: &DimensionFilters,
) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM llm_responses WHERE {FILTER_CLAUSE}");

    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(report_id)
        .bind(filters.region.as_deref())
        .bind(filters.language_code.as_deref())
        .bind(filters.model.as_deref())
        .bind(filters.keyword.as_deref())
        .bind(filters.prompt_template.as_deref())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Fetches a single response by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_response(pool: &PgPool, id: i64) -> Result<Option<ResponseRow>, DbError> {
    let row = sqlx::query_as::<_, ResponseRow>(
        "SELECT id, report_id, position, model, keyword, language_code, region, \
                prompt_template, prompt_text, response_text, kpis, created_at \
         FROM llm_responses \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
