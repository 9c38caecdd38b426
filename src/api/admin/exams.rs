use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::{non_blank, validate_grade, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Exam;
use crate::db::types::Track;
use crate::repositories;
use crate::repositories::exams::{CreateExam, UpdateExam};
use crate::repositories::questions::{NewQuestion, UpdateQuestion};
use crate::schemas::exam::{
    BulkQuestionsCreate, ExamCreate, ExamResponse, ExamUpdate, QuestionCreate, QuestionResponse,
    QuestionUpdate,
};
use crate::schemas::CatalogQuery;
use sqlx::PgPool;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exams).post(create_exam))
        .route("/:exam_id", get(get_exam).put(update_exam).patch(update_exam).delete(delete_exam))
        .route("/:exam_id/questions", get(list_questions).post(add_question))
        .route("/:exam_id/questions/bulk", post(add_questions_bulk))
}

pub(super) fn question_router() -> Router<AppState> {
    Router::new().route(
        "/questions/:question_id",
        put(update_question).patch(update_question).delete(delete_question),
    )
}

async fn load_exam(pool: &PgPool, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(pool, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

async fn list_exams(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<CatalogQuery>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    if let Some(grade) = params.grade {
        validate_grade(grade)?;
    }

    let exams = repositories::exams::list(state.db(), params.grade, params.track)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from_db).collect()))
}

async fn create_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    validate_payload(&payload)?;

    let exam = repositories::exams::create(
        state.db(),
        CreateExam {
            title: payload.title.trim().to_string(),
            grade: payload.grade,
            duration_minutes: payload.duration_minutes,
            attempts_allowed: payload.attempts_allowed,
            is_active: payload.is_active,
            track: Track::for_grade(payload.grade, payload.track),
            show_result_immediately: payload.show_result_immediately,
            drive_link: non_blank(payload.drive_link),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(admin_id = %admin.id, exam_id = %exam.id, "Exam created");
    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = load_exam(state.db(), &exam_id).await?;
    Ok(Json(ExamResponse::from_db(exam)))
}

async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    validate_payload(&payload)?;

    let existing = load_exam(state.db(), &exam_id).await?;
    let grade = payload.grade.unwrap_or(existing.grade);
    let track = Track::for_grade(grade, payload.track.unwrap_or(existing.track));

    let exam = repositories::exams::update(
        state.db(),
        &exam_id,
        UpdateExam {
            title: payload.title.map(|title| title.trim().to_string()),
            grade: Some(grade),
            duration_minutes: payload.duration_minutes,
            attempts_allowed: payload.attempts_allowed,
            is_active: payload.is_active,
            track: Some(track),
            show_result_immediately: payload.show_result_immediately,
            drive_link: payload.drive_link.map(|link| non_blank(Some(link))),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    Ok(Json(ExamResponse::from_db(exam)))
}

async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;
    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, exam_id = %exam_id, "Exam deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_questions(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    let exam = load_exam(state.db(), &exam_id).await?;
    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

fn new_question(payload: QuestionCreate) -> NewQuestion {
    NewQuestion {
        text: payload.text.trim().to_string(),
        options: payload.options,
        correct_answer: payload.correct_answer.trim().to_string(),
        points: payload.points,
    }
}

async fn add_question(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    validate_payload(&payload)?;
    let exam = load_exam(state.db(), &exam_id).await?;

    let question = repositories::questions::create(
        state.db(),
        &exam.id,
        new_question(payload),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn add_questions_bulk(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<BulkQuestionsCreate>,
) -> Result<(StatusCode, Json<Vec<QuestionResponse>>), ApiError> {
    validate_payload(&payload)?;

    let max = state.settings().policy().max_bulk_questions as usize;
    if payload.questions.len() > max {
        return Err(ApiError::BadRequest(format!("at most {max} questions per request")));
    }

    let exam = load_exam(state.db(), &exam_id).await?;
    let questions = repositories::questions::create_many(
        state.db(),
        &exam.id,
        payload.questions.into_iter().map(new_question).collect(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create questions"))?;

    tracing::info!(
        admin_id = %admin.id,
        exam_id = %exam.id,
        count = questions.len(),
        "Questions added in bulk"
    );
    Ok((StatusCode::CREATED, Json(questions.into_iter().map(QuestionResponse::from_db).collect())))
}

async fn update_question(
    Path(question_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    validate_payload(&payload)?;

    let question = repositories::questions::update(
        state.db(),
        &question_id,
        UpdateQuestion {
            text: payload.text.map(|text| text.trim().to_string()),
            options: payload.options,
            correct_answer: payload.correct_answer.map(|answer| answer.trim().to_string()),
            points: payload.points,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    Ok(Json(QuestionResponse::from_db(question)))
}

async fn delete_question(
    Path(question_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::questions::delete_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;
    if !deleted {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
