use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use llmvis_core::{DimensionFilters, KpiSummary, ResponseKpis};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, parse_path, parse_query, ApiError,
    ApiResponse, AppState, FilterQuery, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ReportsQuery {
    pub owner: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportListItem {
    id: i64,
    brand_name: String,
    owner: Option<String>,
    response_count: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReportDetail {
    id: i64,
    brand_name: String,
    competitor_names: Vec<String>,
    owner: Option<String>,
    models: Vec<String>,
    keywords: Vec<String>,
    regions: Vec<String>,
    languages: Vec<String>,
    prompt_templates: Vec<String>,
    kpis: KpiSummary,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ResponseItem {
    id: i64,
    position: i32,
    model: String,
    keyword: String,
    language_code: String,
    region: String,
    prompt_template: String,
    prompt_text: String,
    response_text: String,
    kpis: ResponseKpis,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ResponsesPage {
    report_id: i64,
    filters: DimensionFilters,
    total_count: i64,
    limit: i64,
    offset: i64,
    responses: Vec<ResponseItem>,
}

pub(super) async fn list_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ReportsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ReportListItem>>>, ApiError> {
    let query = parse_query(&req_id.0, query)?;
    let owner = query.owner.as_deref().map(str::trim).filter(|o| !o.is_empty());
    let rows = llmvis_db::list_reports(
        &state.pool,
        owner,
        normalize_limit(query.limit),
        normalize_offset(query.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| ReportListItem {
            id: row.id,
            brand_name: row.brand_name,
            owner: row.owner,
            response_count: row.response_count,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    report_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<ReportDetail>>, ApiError> {
    let report_id = parse_path(&req_id.0, report_id)?;
    let row = llmvis_db::get_report(&state.pool, report_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "report not found"))?;

    Ok(Json(ApiResponse {
        data: ReportDetail {
            id: row.id,
            brand_name: row.brand_name,
            competitor_names: row.competitor_names,
            owner: row.owner,
            models: row.models,
            keywords: row.keywords,
            regions: row.regions,
            languages: row.languages,
            prompt_templates: row.prompt_templates,
            kpis: row.kpis.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/reports/{id}: removes the report and every response it owns.
pub(super) async fn delete_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    report_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let report_id = parse_path(&req_id.0, report_id)?;
    llmvis_db::delete_report(&state.pool, report_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(report_id, "report deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_responses(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    report_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ResponsesPage>>, ApiError> {
    let rid = &req_id.0;
    let report_id = parse_path(rid, report_id)?;
    let query = parse_query(rid, query)?;
    ensure_report_exists(&state, report_id, rid).await?;

    let filters = query.filters();
    let limit = normalize_limit(query.limit);
    let offset = normalize_offset(query.offset);

    let total_count = llmvis_db::count_responses(&state.pool, report_id, &filters)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let rows = llmvis_db::list_responses(&state.pool, report_id, &filters, Some(limit), offset)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let responses = rows
        .into_iter()
        .map(|row| ResponseItem {
            id: row.id,
            position: row.position,
            model: row.model,
            keyword: row.keyword,
            language_code: row.language_code,
            region: row.region,
            prompt_template: row.prompt_template,
            prompt_text: row.prompt_text,
            response_text: row.response_text,
            kpis: row.kpis.0,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: ResponsesPage {
            report_id,
            filters,
            total_count,
            limit,
            offset,
            responses,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn ensure_report_exists(
    state: &AppState,
    report_id: i64,
    request_id: &str,
) -> Result<llmvis_db::ReportRow, ApiError> {
    llmvis_db::get_report(&state.pool, report_id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(request_id, "not_found", "report not found"))
}
