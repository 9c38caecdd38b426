use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Exam;
use crate::db::types::Track;

pub(crate) const COLUMNS: &str = "\
    id, title, grade, duration_minutes, attempts_allowed, is_active, track, \
    show_result_immediately, drive_link, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    grade: Option<i32>,
    track: Option<Track>,
) -> Result<Vec<Exam>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exams WHERE TRUE"));
    if let Some(grade) = grade {
        builder.push(" AND grade = ");
        builder.push_bind(grade);
    }
    if let Some(track) = track {
        builder.push(" AND track = ");
        builder.push_bind(track);
    }
    builder.push(" ORDER BY created_at DESC");

    builder.build_query_as::<Exam>().fetch_all(pool).await
}

/// Active exams among `ids`, newest first.
pub(crate) async fn list_active_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<Exam>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams
         WHERE id = ANY($1) AND is_active = TRUE
         ORDER BY created_at DESC"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Returns the subset of `ids` that reference existing exams.
pub(crate) async fn existing_ids(pool: &PgPool, ids: &[String]) -> Result<Vec<String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar::<_, String>("SELECT id FROM exams WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub(crate) async fn list_titles_by_ids(
    pool: &PgPool,
    exam_ids: &[String],
) -> Result<Vec<(String, String)>, sqlx::Error> {
    if exam_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, (String, String)>("SELECT id, title FROM exams WHERE id = ANY($1)")
        .bind(exam_ids)
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateExam {
    pub(crate) title: String,
    pub(crate) grade: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) attempts_allowed: i32,
    pub(crate) is_active: bool,
    pub(crate) track: Track,
    pub(crate) show_result_immediately: bool,
    pub(crate) drive_link: Option<String>,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateExam) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, grade, duration_minutes, attempts_allowed, is_active, track,
            show_result_immediately, drive_link, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.title)
    .bind(params.grade)
    .bind(params.duration_minutes)
    .bind(params.attempts_allowed)
    .bind(params.is_active)
    .bind(params.track)
    .bind(params.show_result_immediately)
    .bind(params.drive_link)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateExam {
    pub(crate) title: Option<String>,
    pub(crate) grade: Option<i32>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) attempts_allowed: Option<i32>,
    pub(crate) is_active: Option<bool>,
    pub(crate) track: Option<Track>,
    pub(crate) show_result_immediately: Option<bool>,
    /// `Some(None)` clears the link, `None` keeps it.
    pub(crate) drive_link: Option<Option<String>>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateExam,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            title = COALESCE($1, title),
            grade = COALESCE($2, grade),
            duration_minutes = COALESCE($3, duration_minutes),
            attempts_allowed = COALESCE($4, attempts_allowed),
            is_active = COALESCE($5, is_active),
            track = COALESCE($6, track),
            show_result_immediately = COALESCE($7, show_result_immediately),
            drive_link = CASE WHEN $8 THEN $9 ELSE drive_link END,
            updated_at = $10
         WHERE id = $11
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.grade)
    .bind(params.duration_minutes)
    .bind(params.attempts_allowed)
    .bind(params.is_active)
    .bind(params.track)
    .bind(params.show_result_immediately)
    .bind(params.drive_link.is_some())
    .bind(params.drive_link.flatten())
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Deletes the exam (questions and results follow through foreign keys) and withdraws it from
/// every student's grant list.
pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(&mut *tx).await?;
    if deleted.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        "UPDATE students SET accessible_exams = array_remove(accessible_exams, $1)
         WHERE $1 = ANY(accessible_exams)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}
