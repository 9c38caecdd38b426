mod exams;
mod free_videos;
mod results;
mod students;
mod videos;

use axum::Router;

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .nest("/students", students::router())
        .nest("/exams", exams::router())
        .merge(exams::question_router())
        .nest("/videos", videos::router())
        .nest("/free-videos", free_videos::router())
        .nest("/results", results::router())
}
