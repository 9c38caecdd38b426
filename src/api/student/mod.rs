mod handlers;
mod helpers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(handlers::profile))
        .route("/videos", get(handlers::list_videos))
        .route("/exams", get(handlers::list_exams))
        .route("/exams/:exam_id", get(handlers::get_exam))
        .route("/exams/:exam_id/submit", post(handlers::submit_exam))
        .route("/results", get(handlers::list_results))
        .route("/activity/log", post(handlers::log_activity))
}

#[cfg(test)]
mod tests;
