use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{validate_grade, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::video::{VideoPayload, VideoResponse};
use crate::schemas::CatalogQuery;

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_videos).post(create_video)).route(
        "/:video_id",
        get(get_video).put(update_video).patch(update_video).delete(delete_video),
    )
}

async fn list_videos(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> Result<Json<Vec<VideoResponse>>, ApiError> {
    if let Some(grade) = params.grade {
        validate_grade(grade)?;
    }

    let videos = repositories::videos::list(state.db(), params.grade, params.track)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list videos"))?;

    Ok(Json(videos.into_iter().map(VideoResponse::from_db).collect()))
}

async fn create_video(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<VideoPayload>,
) -> Result<(StatusCode, Json<VideoResponse>), ApiError> {
    validate_payload(&payload)?;

    let video = repositories::videos::create(state.db(), payload.into_fields(), primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create video"))?;

    tracing::info!(admin_id = %admin.id, video_id = %video.id, "Video created");
    Ok((StatusCode::CREATED, Json(VideoResponse::from_db(video))))
}

async fn get_video(
    Path(video_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<VideoResponse>, ApiError> {
    let video = repositories::videos::find_by_id(state.db(), &video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load video"))?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    Ok(Json(VideoResponse::from_db(video)))
}

async fn update_video(
    Path(video_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<VideoPayload>,
) -> Result<Json<VideoResponse>, ApiError> {
    validate_payload(&payload)?;

    let video = repositories::videos::update(
        state.db(),
        &video_id,
        payload.into_fields(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update video"))?
    .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    Ok(Json(VideoResponse::from_db(video)))
}

async fn delete_video(
    Path(video_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::videos::delete_by_id(state.db(), &video_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete video"))?;
    if !deleted {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, video_id = %video_id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}
