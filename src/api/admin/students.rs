use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{self, PaginatedResponse};
use crate::api::validation::{non_blank, validate_grade, validate_payload};
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::types::Track;
use crate::repositories;
use crate::repositories::students::{CreateStudent, StudentFilter, UpdateStudent};
use crate::schemas::activity::ActivityResponse;
use crate::schemas::student::{
    GenerateStudentsRequest, PermissionsUpdate, StudentActivityResponse, StudentCreate,
    StudentListQuery, StudentResponse, StudentUpdate,
};
use crate::services::{access_codes, grants};

const ACTIVITY_HISTORY_LIMIT: i64 = 200;
const CODE_GENERATION_ATTEMPTS: usize = 10;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/generate", post(generate_students))
        .route(
            "/:student_id",
            get(get_student).put(update_student).patch(update_student).delete(delete_student),
        )
        .route("/:student_id/permissions", patch(update_permissions))
        .route("/:student_id/toggle-status", patch(toggle_status))
        .route("/:student_id/reset-device", post(reset_device))
        .route("/:student_id/activity", get(student_activity))
}

async fn list_students(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(params): Query<StudentListQuery>,
) -> Result<Json<PaginatedResponse<StudentResponse>>, ApiError> {
    if let Some(grade) = params.grade {
        validate_grade(grade)?;
    }
    let (skip, limit) = pagination::normalize(params.skip, params.limit);
    let filter = StudentFilter { grade: params.grade, track: params.track, search: params.search };

    let students = repositories::students::list(state.db(), &filter, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    let total_count = repositories::students::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    Ok(Json(PaginatedResponse {
        items: students.into_iter().map(StudentResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn create_student(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<StudentCreate>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiError> {
    validate_payload(&payload)?;

    let code = match non_blank(payload.code) {
        Some(code) => {
            let taken = repositories::students::code_exists(state.db(), &code)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to check student code"))?;
            if taken {
                return Err(ApiError::Conflict(format!("Code {code} is already in use")));
            }
            code
        }
        None => free_access_code(&state).await?,
    };

    let student = repositories::students::create(
        state.db(),
        CreateStudent {
            code: &code,
            name: non_blank(payload.name),
            phone: non_blank(payload.phone),
            parent_phone: non_blank(payload.parent_phone),
            grade: payload.grade,
            track: Track::for_grade(payload.grade, payload.track),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Conflict(format!("Code {code} is already in use"))
        }
        other => ApiError::internal(other, "Failed to create student"),
    })?;

    tracing::info!(admin_id = %admin.id, student_id = %student.id, "Student created");
    Ok((StatusCode::CREATED, Json(StudentResponse::from_db(student))))
}

async fn free_access_code(state: &AppState) -> Result<String, ApiError> {
    for _ in 0..CODE_GENERATION_ATTEMPTS {
        let code = access_codes::generate_access_code();
        let taken = repositories::students::code_exists(state.db(), &code)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check student code"))?;
        if !taken {
            return Ok(code);
        }
    }

    Err(ApiError::internal("code space exhausted", "Failed to generate a free access code"))
}

async fn generate_students(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GenerateStudentsRequest>,
) -> Result<(StatusCode, Json<Vec<StudentResponse>>), ApiError> {
    validate_payload(&payload)?;

    let max = state.settings().policy().max_generated_codes;
    if payload.count > max {
        return Err(ApiError::BadRequest(format!("count must not exceed {max}")));
    }

    let students = repositories::students::create_batch(
        state.db(),
        payload.count as usize,
        payload.grade,
        Track::for_grade(payload.grade, payload.track),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to generate students"))?;

    tracing::info!(
        admin_id = %admin.id,
        count = students.len(),
        grade = payload.grade,
        "Student codes generated"
    );
    Ok((StatusCode::CREATED, Json(students.into_iter().map(StudentResponse::from_db).collect())))
}

async fn get_student(
    Path(student_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(StudentResponse::from_db(student)))
}

async fn update_student(
    Path(student_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<StudentUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    validate_payload(&payload)?;

    let existing = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let grade = payload.grade.unwrap_or(existing.grade);
    let track = Track::for_grade(grade, payload.track.unwrap_or(existing.track));

    let student = repositories::students::update(
        state.db(),
        &student_id,
        UpdateStudent {
            name: non_blank(payload.name),
            phone: non_blank(payload.phone),
            parent_phone: non_blank(payload.parent_phone),
            grade,
            track,
            is_subscribed: payload.is_subscribed,
            subscription_expiry: payload.subscription_expiry.map(to_primitive_utc),
            is_banned: payload.is_banned,
            ban_reason: non_blank(payload.ban_reason),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update student"))?
    .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(StudentResponse::from_db(student)))
}

async fn delete_student(
    Path(student_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::students::delete_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete student"))?;
    if !deleted {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    tracing::info!(admin_id = %admin.id, student_id = %student_id, "Student deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_permissions(
    Path(student_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<PermissionsUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    if payload.accessible_videos.is_none() && payload.accessible_exams.is_none() {
        return Err(ApiError::BadRequest(
            "accessible_videos or accessible_exams must be provided".to_string(),
        ));
    }

    let videos = payload.accessible_videos.as_deref().map(grants::normalize);
    let exams = payload.accessible_exams.as_deref().map(grants::normalize);

    if let Some(videos) = videos.as_deref() {
        let existing = repositories::videos::existing_ids(state.db(), videos)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check videos"))?;
        let missing = grants::missing(videos, &existing);
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!("Unknown video ids: {}", missing.join(", "))));
        }
    }
    if let Some(exams) = exams.as_deref() {
        let existing = repositories::exams::existing_ids(state.db(), exams)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check exams"))?;
        let missing = grants::missing(exams, &existing);
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!("Unknown exam ids: {}", missing.join(", "))));
        }
    }

    let student = repositories::students::replace_grants(
        state.db(),
        &student_id,
        videos.as_deref(),
        exams.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update permissions"))?
    .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(StudentResponse::from_db(student)))
}

async fn toggle_status(
    Path(student_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = repositories::students::toggle_active(state.db(), &student_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to toggle student status"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    tracing::info!(
        admin_id = %admin.id,
        student_id = %student.id,
        is_active = student.is_active,
        "Student status changed"
    );
    Ok(Json(StudentResponse::from_db(student)))
}

async fn reset_device(
    Path(student_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = repositories::students::reset_device(state.db(), &student_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to reset device"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    tracing::info!(admin_id = %admin.id, student_id = %student.id, "Student device binding reset");
    Ok(Json(StudentResponse::from_db(student)))
}

async fn student_activity(
    Path(student_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<StudentActivityResponse>, ApiError> {
    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let activities =
        repositories::activities::list_by_student(state.db(), &student.id, ACTIVITY_HISTORY_LIMIT)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load activity"))?;

    Ok(Json(StudentActivityResponse {
        student: StudentResponse::from_db(student),
        activities: activities.into_iter().map(ActivityResponse::from_db).collect(),
    }))
}
