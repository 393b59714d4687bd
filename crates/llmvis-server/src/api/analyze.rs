//! POST /api/v1/analyze: run a batch and persist its report.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use llmvis_core::{AnalyzeRequest, AnalyzeResponse};

use crate::middleware::{owner_from_headers, RequestId};

use super::{map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AnalyzeResponse>>), ApiError> {
    let rid = &req_id.0;

    let Json(request) =
        payload.map_err(|e| ApiError::new(rid.clone(), "bad_request", e.body_text()))?;

    // Reject before any external call is made.
    let validated = request
        .validate()
        .map_err(|e| ApiError::new(rid.clone(), "validation_error", e.to_string()))?;

    let owner = owner_from_headers(&headers);
    let response = state
        .pipeline
        .analyze(&state.pool, validated, owner, state.analysis_timeout)
        .await
        .map_err(|e| map_analysis_error(rid.clone(), &e))?;

    tracing::info!(
        report_id = response.report_id,
        total = response.total_queries,
        failed = response.failed_queries,
        "report created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: response,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
