use crate::api::errors::ApiError;
use crate::db::models::{Exam, Student};
use crate::repositories;
use sqlx::PgPool;

const EXAM_ACCESS_DENIED: &str = "You do not have access to this exam";

/// Loads an exam the student may take: granted, active and matching the student's grade.
/// Unknown ids are reported the same way as denied ones.
pub(super) async fn load_accessible_exam(
    pool: &PgPool,
    student: &Student,
    exam_id: &str,
) -> Result<Exam, ApiError> {
    if !student.can_access_exam(exam_id) {
        return Err(ApiError::Forbidden(EXAM_ACCESS_DENIED));
    }

    let exam = repositories::exams::find_by_id(pool, exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or(ApiError::Forbidden(EXAM_ACCESS_DENIED))?;

    if !exam.is_active || exam.grade != student.grade {
        return Err(ApiError::Forbidden(EXAM_ACCESS_DENIED));
    }

    Ok(exam)
}
