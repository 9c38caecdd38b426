use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::FreeVideo;
use crate::db::types::VideoSource;

const COLUMNS: &str = "id, title, youtube_id, description, source_type, created_at, updated_at";

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<FreeVideo>, sqlx::Error> {
    sqlx::query_as::<_, FreeVideo>(&format!(
        "SELECT {COLUMNS} FROM free_videos ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct FreeVideoFields {
    pub(crate) title: String,
    pub(crate) youtube_id: String,
    pub(crate) description: Option<String>,
    pub(crate) source_type: VideoSource,
}

pub(crate) async fn create(
    pool: &PgPool,
    fields: FreeVideoFields,
    now: PrimitiveDateTime,
) -> Result<FreeVideo, sqlx::Error> {
    sqlx::query_as::<_, FreeVideo>(&format!(
        "INSERT INTO free_videos (
            id, title, youtube_id, description, source_type, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$6)
        RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(fields.title)
    .bind(fields.youtube_id)
    .bind(fields.description)
    .bind(fields.source_type)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    fields: FreeVideoFields,
    now: PrimitiveDateTime,
) -> Result<Option<FreeVideo>, sqlx::Error> {
    sqlx::query_as::<_, FreeVideo>(&format!(
        "UPDATE free_videos SET
            title = $1,
            youtube_id = $2,
            description = $3,
            source_type = $4,
            updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}"
    ))
    .bind(fields.title)
    .bind(fields.youtube_id)
    .bind(fields.description)
    .bind(fields.source_type)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM free_videos WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
