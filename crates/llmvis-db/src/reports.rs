//! Database operations for `reports`.

use chrono::{DateTime, Utc};
use llmvis_core::{KpiSummary, NewReport};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::DbError;

/// Postgres caps a statement at 65 535 bind parameters; each response row
/// binds 11.
const RESPONSE_INSERT_CHUNK: usize = 1_000;

/// A row from the `reports` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportRow {
    pub id: i64,
    pub brand_name: String,
    pub competitor_names: Vec<String>,
    pub owner: Option<String>,
    pub models: Vec<String>,
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
    pub prompt_templates: Vec<String>,
    pub kpis: Json<KpiSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact report row for listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReportListRow {
    pub id: i64,
    pub brand_name: String,
    pub owner: Option<String>,
    pub response_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Inserts a report and all of its responses in one transaction.
///
/// Responses keep the order of `report.responses` through the `position`
/// column. Nothing is written if any statement fails.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert or the commit fails.
pub async fn insert_report(pool: &PgPool, report: &NewReport) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let report_id: i64 = sqlx::query_scalar(
        "INSERT INTO reports \
             (brand_name, competitor_names, owner, models, keywords, regions, \
              languages, prompt_templates, kpis) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(&report.brand_name)
    .bind(&report.competitor_names)
    .bind(report.owner.as_deref())
    .bind(&report.models)
    .bind(&report.keywords)
    .bind(&report.regions)
    .bind(&report.languages)
    .bind(&report.prompt_templates)
    .bind(Json(&report.kpis))
    .fetch_one(&mut *tx)
    .await?;

    for (chunk_index, chunk) in report.responses.chunks(RESPONSE_INSERT_CHUNK).enumerate() {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "INSERT INTO llm_responses \
                 (report_id, position, model, keyword, language_code, region, \
                  prompt_template, prompt_text, response_text, kpis) ",
        );
        let offset = chunk_index * RESPONSE_INSERT_CHUNK;
        builder.push_values(chunk.iter().enumerate(), |mut row, (i, response)| {
            let position = i32::try_from(offset + i).unwrap_or(i32::MAX);
            row.push_bind(report_id)
                .push_bind(position)
                .push_bind(&response.model)
                .push_bind(&response.keyword)
                .push_bind(&response.language_code)
                .push_bind(&response.region)
                .push_bind(&response.prompt_template)
                .push_bind(&response.prompt_text)
                .push_bind(&response.response_text)
                .push_bind(Json(&response.kpis));
        });
        builder.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    tracing::debug!(
        report_id,
        responses = report.responses.len(),
        "report persisted"
    );
    Ok(report_id)
}

/// Fetches a report by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_report(pool: &PgPool, id: i64) -> Result<Option<ReportRow>, DbError> {
    let row = sqlx::query_as::<_, ReportRow>(
        "SELECT id, brand_name, competitor_names, owner, models, keywords, regions, \
                languages, prompt_templates, kpis, created_at, updated_at \
         FROM reports \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists reports newest first, optionally restricted to one owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reports(
    pool: &PgPool,
    owner: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ReportListRow>, DbError> {
    let rows = sqlx::query_as::<_, ReportListRow>(
        "SELECT r.id, r.brand_name, r.owner, r.created_at, \
                (SELECT COUNT(*) FROM llm_responses lr WHERE lr.report_id = r.id) \
                    AS response_count \
         FROM reports r \
         WHERE ($1::TEXT IS NULL OR r.owner = $1) \
         ORDER BY r.created_at DESC, r.id DESC \
         LIMIT $2 OFFSET $3",
    )
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes a report; its responses go with it through `ON DELETE CASCADE`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no report has this id, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_report(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM reports WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
