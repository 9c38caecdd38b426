use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::video::FreeVideoResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/free-videos", get(list_free_videos))
}

async fn list_free_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<FreeVideoResponse>>, ApiError> {
    let videos = repositories::free_videos::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list free videos"))?;

    Ok(Json(videos.into_iter().map(FreeVideoResponse::from_db).collect()))
}
