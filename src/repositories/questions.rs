use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Question;

pub(crate) const COLUMNS: &str =
    "id, exam_id, text, options, correct_answer, points, position, created_at, updated_at";

pub(crate) struct NewQuestion {
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) points: i32,
}

pub(crate) async fn list_by_exam(pool: &PgPool, exam_id: &str) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY position, created_at"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

async fn insert_at_end(
    conn: &mut PgConnection,
    exam_id: &str,
    question: NewQuestion,
    now: PrimitiveDateTime,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, text, options, correct_answer, points, position, created_at, updated_at
        )
        SELECT $1, $2, $3, $4, $5, $6,
               COALESCE((SELECT MAX(position) + 1 FROM questions WHERE exam_id = $2), 0),
               $7, $7
        RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(exam_id)
    .bind(question.text)
    .bind(question.options)
    .bind(question.correct_answer)
    .bind(question.points)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    exam_id: &str,
    question: NewQuestion,
    now: PrimitiveDateTime,
) -> Result<Question, sqlx::Error> {
    let mut tx = pool.begin().await?;
    lock_exam(&mut *tx, exam_id).await?;
    let created = insert_at_end(&mut *tx, exam_id, question, now).await?;
    tx.commit().await?;
    Ok(created)
}

/// Appends all questions to the exam in order, in one transaction.
pub(crate) async fn create_many(
    pool: &PgPool,
    exam_id: &str,
    questions: Vec<NewQuestion>,
    now: PrimitiveDateTime,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    lock_exam(&mut *tx, exam_id).await?;

    let mut created = Vec::with_capacity(questions.len());
    for question in questions {
        created.push(insert_at_end(&mut *tx, exam_id, question, now).await?);
    }

    tx.commit().await?;
    Ok(created)
}

// Serializes position assignment per exam.
async fn lock_exam(conn: &mut PgConnection, exam_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT id FROM exams WHERE id = $1 FOR UPDATE")
        .bind(exam_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) struct UpdateQuestion {
    pub(crate) text: Option<String>,
    pub(crate) options: Option<Vec<String>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) points: Option<i32>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            text = COALESCE($1, text),
            options = COALESCE($2, options),
            correct_answer = COALESCE($3, correct_answer),
            points = COALESCE($4, points),
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}"
    ))
    .bind(params.text)
    .bind(params.options)
    .bind(params.correct_answer)
    .bind(params.points)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
