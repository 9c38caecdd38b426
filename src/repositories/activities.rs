use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Activity;
use crate::db::types::ActivityAction;

const COLUMNS: &str = "id, student_id, action, target_id, details, logged_at";

pub(crate) struct NewActivity<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) action: ActivityAction,
    pub(crate) target_id: Option<&'a str>,
    pub(crate) details: Option<serde_json::Value>,
    pub(crate) logged_at: PrimitiveDateTime,
}

/// Inserts the activity on an open connection and, unless it is a heartbeat, moves the
/// student's `last_active` to the activity time.
pub(crate) async fn insert(
    conn: &mut PgConnection,
    params: NewActivity<'_>,
) -> Result<Activity, sqlx::Error> {
    let activity = sqlx::query_as::<_, Activity>(&format!(
        "INSERT INTO activities (id, student_id, action, target_id, details, logged_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.student_id)
    .bind(params.action)
    .bind(params.target_id)
    .bind(params.details.map(Json))
    .bind(params.logged_at)
    .fetch_one(&mut *conn)
    .await?;

    if params.action.refreshes_last_active() {
        sqlx::query("UPDATE students SET last_active = $1 WHERE id = $2")
            .bind(params.logged_at)
            .bind(params.student_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(activity)
}

pub(crate) async fn append(
    pool: &PgPool,
    params: NewActivity<'_>,
) -> Result<Activity, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let activity = insert(&mut *tx, params).await?;
    tx.commit().await?;
    Ok(activity)
}

pub(crate) async fn list_by_student(
    pool: &PgPool,
    student_id: &str,
    limit: i64,
) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>(&format!(
        "SELECT {COLUMNS} FROM activities
         WHERE student_id = $1
         ORDER BY logged_at DESC
         LIMIT $2"
    ))
    .bind(student_id)
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}
