use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::non_blank;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::results::ResultFilter;
use crate::schemas::result::{ResultListQuery, ResultResponse, ResultSummaryResponse};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_results))
        .route("/:result_id", get(get_result).delete(delete_result))
}

async fn list_results(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<ResultListQuery>,
) -> Result<Json<PaginatedResponse<ResultSummaryResponse>>, ApiError> {
    let (skip, limit) = pagination::normalize(params.skip, params.limit);
    let filter =
        ResultFilter { exam_id: non_blank(params.exam_id), student_id: non_blank(params.student_id) };

    let rows = repositories::results::list_summaries(state.db(), &filter, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;
    let total_count = repositories::results::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count results"))?;

    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(ResultSummaryResponse::from_row).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn get_result(
    Path(result_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ResultResponse>, ApiError> {
    let result = repositories::results::find_by_id(state.db(), &result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load result"))?
        .ok_or_else(|| ApiError::NotFound("Result not found".to_string()))?;

    Ok(Json(ResultResponse::from_db(result)))
}

async fn delete_result(
    Path(result_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::results::delete_by_id(state.db(), &result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete result"))?;
    if !deleted {
        return Err(ApiError::NotFound("Result not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, result_id = %result_id, "Result deleted");
    Ok(StatusCode::NO_CONTENT)
}
