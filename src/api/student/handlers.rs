use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::api::validation::validate_payload;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::activities::NewActivity;
use crate::repositories::results::{NewResult, SubmitOutcome};
use crate::schemas::activity::{ActivityCreate, ActivityLoggedResponse};
use crate::schemas::exam::{
    ExamResponse, PublicQuestionResponse, StudentExamResponse, SubmitExamRequest,
};
use crate::schemas::result::{ResultResponse, StudentResultResponse};
use crate::schemas::student::StudentProfileResponse;
use crate::schemas::video::VideoResponse;
use crate::services::grading::{self, SubmittedAnswer};

use super::helpers::load_accessible_exam;

pub(super) async fn profile(
    CurrentStudent(student): CurrentStudent,
) -> Result<Json<StudentProfileResponse>, ApiError> {
    Ok(Json(StudentProfileResponse::from_db(student)))
}

pub(super) async fn list_videos(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<VideoResponse>>, ApiError> {
    let videos = repositories::videos::list_by_ids(state.db(), &student.accessible_videos)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list videos"))?;

    Ok(Json(videos.into_iter().map(VideoResponse::from_db).collect()))
}

pub(super) async fn list_exams(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = repositories::exams::list_active_by_ids(state.db(), &student.accessible_exams)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from_db).collect()))
}

pub(super) async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<StudentExamResponse>, ApiError> {
    let exam = load_accessible_exam(state.db(), &student, &exam_id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    Ok(Json(StudentExamResponse {
        exam: ExamResponse::from_db(exam),
        questions: questions.into_iter().map(PublicQuestionResponse::from_db).collect(),
    }))
}

pub(super) async fn submit_exam(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<Json<ResultResponse>, ApiError> {
    let exam = load_accessible_exam(state.db(), &student, &exam_id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    let submitted: Vec<SubmittedAnswer> = payload
        .answers
        .into_iter()
        .map(|answer| SubmittedAnswer {
            question_id: answer.question_id,
            selected_answer: answer.selected_answer,
        })
        .collect();
    let graded = grading::grade(&questions, &submitted);

    let outcome = repositories::results::create_within_attempts(
        state.db(),
        NewResult {
            student_id: &student.id,
            exam_id: &exam.id,
            attempts_allowed: exam.attempts_allowed,
            score: graded.score,
            total_points: graded.total_points,
            answers: graded.answers,
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save result"))?;

    match outcome {
        SubmitOutcome::Recorded(result) => {
            tracing::info!(
                student_id = %student.id,
                exam_id = %exam.id,
                result_id = %result.id,
                score = result.score,
                total_points = result.total_points,
                "Exam submitted"
            );
            metrics::record_submission(result.score, result.total_points);
            Ok(Json(ResultResponse::from_db(result)))
        }
        SubmitOutcome::AttemptsExhausted => Err(ApiError::Forbidden("No attempts remaining")),
    }
}

pub(super) async fn list_results(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentResultResponse>>, ApiError> {
    let results = repositories::results::list_by_student(state.db(), &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;

    let mut exam_ids: Vec<String> = results.iter().map(|result| result.exam_id.clone()).collect();
    exam_ids.sort();
    exam_ids.dedup();

    let titles: HashMap<String, String> =
        repositories::exams::list_titles_by_ids(state.db(), &exam_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load exam titles"))?
            .into_iter()
            .collect();

    let response = results
        .into_iter()
        .map(|result| {
            let exam_title = titles.get(&result.exam_id).cloned();
            StudentResultResponse { result: ResultResponse::from_db(result), exam_title }
        })
        .collect();

    Ok(Json(response))
}

pub(super) async fn log_activity(
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<ActivityCreate>,
) -> Result<(StatusCode, Json<ActivityLoggedResponse>), ApiError> {
    validate_payload(&payload)?;

    let activity = repositories::activities::append(
        state.db(),
        NewActivity {
            student_id: &student.id,
            action: payload.action,
            target_id: payload.target_id.as_deref(),
            details: payload.details,
            logged_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to log activity"))?;

    Ok((StatusCode::CREATED, Json(ActivityLoggedResponse { success: true, id: activity.id })))
}
