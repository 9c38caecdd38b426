use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::video::{FreeVideoPayload, FreeVideoResponse};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_free_videos).post(create_free_video))
        .route(
            "/:video_id",
            put(update_free_video).patch(update_free_video).delete(delete_free_video),
        )
}

async fn list_free_videos(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<FreeVideoResponse>>, ApiError> {
    let videos = repositories::free_videos::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list free videos"))?;

    Ok(Json(videos.into_iter().map(FreeVideoResponse::from_db).collect()))
}

async fn create_free_video(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<FreeVideoPayload>,
) -> Result<(StatusCode, Json<FreeVideoResponse>), ApiError> {
    validate_payload(&payload)?;

    let video =
        repositories::free_videos::create(state.db(), payload.into_fields(), primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create free video"))?;

    Ok((StatusCode::CREATED, Json(FreeVideoResponse::from_db(video))))
}

async fn update_free_video(
    Path(video_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<FreeVideoPayload>,
) -> Result<Json<FreeVideoResponse>, ApiError> {
    validate_payload(&payload)?;

    let video = repositories::free_videos::update(
        state.db(),
        &video_id,
        payload.into_fields(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update free video"))?
    .ok_or_else(|| ApiError::NotFound("Free video not found".to_string()))?;

    Ok(Json(FreeVideoResponse::from_db(video)))
}

async fn delete_free_video(
    Path(video_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::free_videos::delete_by_id(state.db(), &video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete free video"))?;
    if !deleted {
        return Err(ApiError::NotFound("Free video not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
