use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::ExamResult;
use crate::db::types::{ActivityAction, AnswerRecord};
use crate::repositories::activities::{self, NewActivity};

const COLUMNS: &str = "id, student_id, exam_id, score, total_points, answers, submitted_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ResultSummaryRow {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_code: String,
    pub(crate) student_name: Option<String>,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) submitted_at: PrimitiveDateTime,
}

pub(crate) struct NewResult<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) attempts_allowed: i32,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) answers: Vec<AnswerRecord>,
    pub(crate) submitted_at: PrimitiveDateTime,
}

#[derive(Debug)]
pub(crate) enum SubmitOutcome {
    Recorded(ExamResult),
    AttemptsExhausted,
}

/// Inserts a result unless the student already used every allowed attempt for the exam.
///
/// The student row is locked for the duration of the transaction so concurrent submissions
/// from one account are counted one after another.
pub(crate) async fn create_within_attempts(
    pool: &PgPool,
    params: NewResult<'_>,
) -> Result<SubmitOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM students WHERE id = $1 FOR UPDATE")
        .bind(params.student_id)
        .fetch_one(&mut *tx)
        .await?;

    let used: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE student_id = $1 AND exam_id = $2")
            .bind(params.student_id)
            .bind(params.exam_id)
            .fetch_one(&mut *tx)
            .await?;

    if used >= i64::from(params.attempts_allowed) {
        return Ok(SubmitOutcome::AttemptsExhausted);
    }

    let result = sqlx::query_as::<_, ExamResult>(&format!(
        "INSERT INTO results (id, student_id, exam_id, score, total_points, answers, submitted_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.student_id)
    .bind(params.exam_id)
    .bind(params.score)
    .bind(params.total_points)
    .bind(Json(params.answers))
    .bind(params.submitted_at)
    .fetch_one(&mut *tx)
    .await?;

    activities::insert(
        &mut *tx,
        NewActivity {
            student_id: params.student_id,
            action: ActivityAction::SubmitExam,
            target_id: Some(params.exam_id),
            details: Some(serde_json::json!({
                "result_id": result.id,
                "score": result.score,
                "total_points": result.total_points,
            })),
            logged_at: params.submitted_at,
        },
    )
    .await?;

    tx.commit().await?;
    Ok(SubmitOutcome::Recorded(result))
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!(
        "SELECT {COLUMNS} FROM results WHERE student_id = $1 ORDER BY submitted_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<ExamResult>, sqlx::Error> {
    sqlx::query_as::<_, ExamResult>(&format!("SELECT {COLUMNS} FROM results WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, Default)]
pub(crate) struct ResultFilter {
    pub(crate) exam_id: Option<String>,
    pub(crate) student_id: Option<String>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ResultFilter) {
    builder.push(" WHERE TRUE");
    if let Some(exam_id) = filter.exam_id.clone() {
        builder.push(" AND r.exam_id = ");
        builder.push_bind(exam_id);
    }
    if let Some(student_id) = filter.student_id.clone() {
        builder.push(" AND r.student_id = ");
        builder.push_bind(student_id);
    }
}

pub(crate) async fn list_summaries(
    pool: &PgPool,
    filter: &ResultFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<ResultSummaryRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT r.id,
                r.student_id,
                s.code AS student_code,
                s.name AS student_name,
                r.exam_id,
                e.title AS exam_title,
                r.score,
                r.total_points,
                r.submitted_at
         FROM results r
         JOIN students s ON s.id = r.student_id
         JOIN exams e ON e.id = r.exam_id",
    );
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY r.submitted_at DESC OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<ResultSummaryRow>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &ResultFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM results r");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM results WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
