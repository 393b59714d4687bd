//! GET /api/v1/reports/{id}/kpis: filtered, optionally grouped visibility metrics.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use llmvis_analysis::{group_by, summarize};
use llmvis_core::{DimensionFilters, GroupDimension, KpiSummary};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::reports::ensure_report_exists;
use super::{
    map_db_error, normalize_limit, normalize_offset, parse_path, parse_query, ApiError,
    ApiResponse, AppState, FilterQuery, ResponseMeta,
};

/// Read from the same query string as [`FilterQuery`].
#[derive(Debug, Default, Deserialize)]
pub(super) struct GroupingQuery {
    pub group_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct GroupItem {
    key: String,
    kpis: KpiSummary,
}

#[derive(Debug, Serialize)]
pub(super) struct KpiData {
    report_id: i64,
    brand_name: String,
    filters: DimensionFilters,
    /// Responses matching `filters`.
    total_count: usize,
    group_by: Option<GroupDimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kpis: Option<KpiSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<GroupItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_groups: Option<usize>,
}

pub(super) async fn report_kpis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    report_id: Result<Path<i64>, PathRejection>,
    grouping: Result<Query<GroupingQuery>, QueryRejection>,
    query: Result<Query<FilterQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<KpiData>>, ApiError> {
    let rid = &req_id.0;
    let report_id = parse_path(rid, report_id)?;
    let grouping = parse_query(rid, grouping)?;
    let query = parse_query(rid, query)?;

    let dimension = match grouping.group_by.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<GroupDimension>()
                .map_err(|e| ApiError::new(rid.clone(), "bad_request", e.to_string()))?,
        ),
    };

    let report = ensure_report_exists(&state, report_id, rid).await?;
    let filters = query.filters();

    let rows = llmvis_db::list_responses(&state.pool, report_id, &filters, None, 0)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let mut data = KpiData {
        report_id,
        brand_name: report.brand_name,
        filters,
        total_count: rows.len(),
        group_by: dimension,
        kpis: None,
        groups: None,
        total_groups: None,
    };

    match dimension {
        None => {
            data.kpis = Some(summarize(
                rows.iter().map(|r| &r.kpis.0),
                &report.competitor_names,
            ));
        }
        Some(dimension) => {
            let buckets = group_by(&rows, dimension, &report.competitor_names);
            let limit = usize::try_from(normalize_limit(query.limit)).unwrap_or(50);
            let offset = usize::try_from(normalize_offset(query.offset)).unwrap_or(0);
            data.total_groups = Some(buckets.len());
            data.groups = Some(
                buckets
                    .into_iter()
                    .skip(offset)
                    .take(limit)
                    .map(|(key, kpis)| GroupItem { key, kpis })
                    .collect(),
            );
        }
    }

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
