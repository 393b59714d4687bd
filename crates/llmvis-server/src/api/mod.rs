mod analyze;
mod kpis;
mod reports;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use llmvis_analysis::{AnalysisError, Pipeline};
use llmvis_clients::{QueryClient, TranslationClient};
use llmvis_core::DimensionFilters;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, RateLimitState, RequestId, REQUEST_ID_HEADER, USER_ID_HEADER,
};

pub type LivePipeline = Pipeline<TranslationClient, QueryClient>;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub pipeline: Arc<LivePipeline>,
    pub analysis_timeout: Duration,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_failed" => StatusCode::BAD_GATEWAY,
            "timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Dimension filters and paging shared by the response and KPI listings.
///
/// Kept flat rather than flattening [`DimensionFilters`] because
/// `serde_urlencoded` cannot parse numbers inside a flattened struct.
#[derive(Debug, Default, Deserialize)]
pub(super) struct FilterQuery {
    pub region: Option<String>,
    pub language_code: Option<String>,
    pub model: Option<String>,
    pub keyword: Option<String>,
    pub prompt_template: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FilterQuery {
    /// Blank values mean "no filter".
    pub(super) fn filters(&self) -> DimensionFilters {
        fn present(value: Option<&String>) -> Option<String> {
            value
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        }
        DimensionFilters {
            region: present(self.region.as_ref()),
            language_code: present(self.language_code.as_ref()),
            model: present(self.model.as_ref()),
            keyword: present(self.keyword.as_ref()),
            prompt_template: present(self.prompt_template.as_ref()),
        }
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn normalize_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Turns a malformed query string into the JSON error envelope.
pub(super) fn parse_query<T>(
    request_id: &str,
    query: Result<Query<T>, QueryRejection>,
) -> Result<T, ApiError> {
    query
        .map(|Query(value)| value)
        .map_err(|e| ApiError::new(request_id, "bad_request", e.body_text()))
}

/// Same as [`parse_query`] for path parameters such as a non-numeric id.
pub(super) fn parse_path<T>(
    request_id: &str,
    path: Result<Path<T>, PathRejection>,
) -> Result<T, ApiError> {
    path.map(|Path(value)| value)
        .map_err(|e| ApiError::new(request_id, "bad_request", e.body_text()))
}

pub(super) fn map_db_error(request_id: String, error: &llmvis_db::DbError) -> ApiError {
    if matches!(error, llmvis_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "report not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_analysis_error(request_id: String, error: &AnalysisError) -> ApiError {
    match error {
        AnalysisError::Validation(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        AnalysisError::AllQueriesFailed { .. } => {
            ApiError::new(request_id, "upstream_failed", error.to_string())
        }
        AnalysisError::Timeout { .. } => ApiError::new(request_id, "timeout", error.to_string()),
        AnalysisError::OutcomeMismatch { .. } | AnalysisError::Persistence(_) => {
            tracing::error!(error = %error, "analysis failed");
            ApiError::new(request_id, "internal_error", "failed to generate report")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

fn protected_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/analyze", post(analyze::analyze))
        .route("/api/v1/reports", get(reports::list_reports))
        .route(
            "/api/v1/reports/{report_id}",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route(
            "/api/v1/reports/{report_id}/responses",
            get(reports::list_responses),
        )
        .route("/api/v1/reports/{report_id}/kpis", get(kpis::report_kpis))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match llmvis_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
