use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Video;
use crate::db::types::Track;

const COLUMNS: &str = "\
    id, title, grade, track, dailymotion_id, unit, lesson, description, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!("SELECT {COLUMNS} FROM videos WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    grade: Option<i32>,
    track: Option<Track>,
) -> Result<Vec<Video>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM videos WHERE TRUE"));
    if let Some(grade) = grade {
        builder.push(" AND grade = ");
        builder.push_bind(grade);
    }
    if let Some(track) = track {
        builder.push(" AND track = ");
        builder.push_bind(track);
    }
    builder.push(" ORDER BY created_at DESC");

    builder.build_query_as::<Video>().fetch_all(pool).await
}

pub(crate) async fn list_by_ids(pool: &PgPool, ids: &[String]) -> Result<Vec<Video>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Video>(&format!(
        "SELECT {COLUMNS} FROM videos WHERE id = ANY($1) ORDER BY created_at DESC"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn existing_ids(pool: &PgPool, ids: &[String]) -> Result<Vec<String>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_scalar::<_, String>("SELECT id FROM videos WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub(crate) struct VideoFields {
    pub(crate) title: String,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) dailymotion_id: String,
    pub(crate) unit: Option<String>,
    pub(crate) lesson: Option<String>,
    pub(crate) description: Option<String>,
}

pub(crate) async fn create(
    pool: &PgPool,
    fields: VideoFields,
    now: PrimitiveDateTime,
) -> Result<Video, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!(
        "INSERT INTO videos (
            id, title, grade, track, dailymotion_id, unit, lesson, description,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(fields.title)
    .bind(fields.grade)
    .bind(fields.track)
    .bind(fields.dailymotion_id)
    .bind(fields.unit)
    .bind(fields.lesson)
    .bind(fields.description)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    fields: VideoFields,
    now: PrimitiveDateTime,
) -> Result<Option<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(&format!(
        "UPDATE videos SET
            title = $1,
            grade = $2,
            track = $3,
            dailymotion_id = $4,
            unit = $5,
            lesson = $6,
            description = $7,
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}"
    ))
    .bind(fields.title)
    .bind(fields.grade)
    .bind(fields.track)
    .bind(fields.dailymotion_id)
    .bind(fields.unit)
    .bind(fields.lesson)
    .bind(fields.description)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Deletes the video and withdraws it from every student's grant list.
pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted =
        sqlx::query("DELETE FROM videos WHERE id = $1").bind(id).execute(&mut *tx).await?;
    if deleted.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        "UPDATE students SET accessible_videos = array_remove(accessible_videos, $1)
         WHERE $1 = ANY(accessible_videos)",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}
