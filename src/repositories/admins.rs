use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Admin;

const COLUMNS: &str = "id, username, hashed_password, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admins WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admins WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateAdmin<'a> {
    pub(crate) id: &'a str,
    pub(crate) username: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateAdmin<'_>) -> Result<Admin, sqlx::Error> {
    sqlx::query_as::<_, Admin>(&format!(
        "INSERT INTO admins (id, username, hashed_password, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.hashed_password)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update_password(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admins SET hashed_password = $1, updated_at = $2 WHERE id = $3")
        .bind(hashed_password)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
