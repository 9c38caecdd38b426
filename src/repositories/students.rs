use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::Student;
use crate::db::types::{ActivityAction, Track};
use crate::repositories::activities::{self, NewActivity};
use crate::services::access_codes;

pub(crate) const COLUMNS: &str = "\
    id, code, name, phone, parent_phone, grade, track, is_activated, current_session_id, \
    device_id, device_mismatch_attempts, last_device_mismatch, is_banned, ban_reason, \
    is_subscribed, subscription_expiry, last_login, last_active, is_active, \
    accessible_videos, accessible_exams, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Login lookup: disabled accounts are invisible to it.
pub(crate) async fn find_enabled_by_code(
    pool: &PgPool,
    code: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE code = $1 AND is_active = TRUE"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn code_exists(pool: &PgPool, code: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE code = $1)")
        .bind(code)
        .fetch_one(pool)
        .await
}

#[derive(Debug, Default)]
pub(crate) struct StudentFilter {
    pub(crate) grade: Option<i32>,
    pub(crate) track: Option<Track>,
    pub(crate) search: Option<String>,
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &StudentFilter) {
    builder.push(" WHERE TRUE");
    if let Some(grade) = filter.grade {
        builder.push(" AND grade = ");
        builder.push_bind(grade);
    }
    if let Some(track) = filter.track {
        builder.push(" AND track = ");
        builder.push_bind(track);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder.push(" AND (code ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR phone ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &StudentFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM students"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY created_at DESC, code OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<Student>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &StudentFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM students");
    push_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) struct CreateStudent<'a> {
    pub(crate) code: &'a str,
    pub(crate) name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) parent_phone: Option<String>,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateStudent<'_>,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (
            id, code, name, phone, parent_phone, grade, track, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.code)
    .bind(params.name)
    .bind(params.phone)
    .bind(params.parent_phone)
    .bind(params.grade)
    .bind(params.track)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

/// Creates `count` blank accounts with fresh access codes in one transaction. Codes that
/// collide with existing rows are regenerated.
pub(crate) async fn create_batch(
    pool: &PgPool,
    count: usize,
    grade: i32,
    track: Track,
    now: PrimitiveDateTime,
) -> Result<Vec<Student>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut created: Vec<Student> = Vec::with_capacity(count);

    while created.len() < count {
        let taken: Vec<String> = created.iter().map(|student| student.code.clone()).collect();
        for code in access_codes::generate_unique_codes(count - created.len(), &taken) {
            let inserted = sqlx::query_as::<_, Student>(&format!(
                "INSERT INTO students (id, code, grade, track, created_at, updated_at)
                 VALUES ($1,$2,$3,$4,$5,$5)
                 ON CONFLICT (code) DO NOTHING
                 RETURNING {COLUMNS}"
            ))
            .bind(Uuid::new_v4().to_string())
            .bind(&code)
            .bind(grade)
            .bind(track)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(student) = inserted {
                created.push(student);
            }
        }
    }

    tx.commit().await?;
    Ok(created)
}

pub(crate) struct UpdateStudent {
    pub(crate) name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) parent_phone: Option<String>,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) is_subscribed: Option<bool>,
    pub(crate) subscription_expiry: Option<PrimitiveDateTime>,
    pub(crate) is_banned: Option<bool>,
    pub(crate) ban_reason: Option<String>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateStudent,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "UPDATE students SET
            name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            parent_phone = COALESCE($3, parent_phone),
            grade = $4,
            track = $5,
            is_subscribed = COALESCE($6, is_subscribed),
            subscription_expiry = COALESCE($7, subscription_expiry),
            is_banned = COALESCE($8, is_banned),
            ban_reason = CASE
                WHEN $8 IS FALSE THEN NULL
                ELSE COALESCE($9, ban_reason)
            END,
            device_mismatch_attempts = CASE
                WHEN $8 IS FALSE THEN 0
                ELSE device_mismatch_attempts
            END,
            updated_at = $10
         WHERE id = $11
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.phone)
    .bind(params.parent_phone)
    .bind(params.grade)
    .bind(params.track)
    .bind(params.is_subscribed)
    .bind(params.subscription_expiry)
    .bind(params.is_banned)
    .bind(params.ban_reason)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Flips the admin enable flag. Disabling also ends the current session.
pub(crate) async fn toggle_active(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "UPDATE students SET
            is_active = NOT is_active,
            current_session_id = CASE WHEN is_active THEN NULL ELSE current_session_id END,
            updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Clears the device binding and its mismatch counters, and ends the current session.
pub(crate) async fn reset_device(
    pool: &PgPool,
    id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "UPDATE students SET
            device_id = NULL,
            device_mismatch_attempts = 0,
            last_device_mismatch = NULL,
            current_session_id = NULL,
            updated_at = $1
         WHERE id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Records a login from an unrecognised device. `ban_reason` bans the account in the same write.
pub(crate) async fn record_device_mismatch(
    pool: &PgPool,
    id: &str,
    ban_reason: Option<&str>,
    now: PrimitiveDateTime,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "UPDATE students SET
            device_mismatch_attempts = device_mismatch_attempts + 1,
            last_device_mismatch = $1,
            is_banned = is_banned OR $2::text IS NOT NULL,
            ban_reason = COALESCE($2, ban_reason),
            updated_at = $1
         WHERE id = $3
         RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(ban_reason)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) struct Activation {
    pub(crate) name: String,
    pub(crate) phone: String,
    pub(crate) parent_phone: String,
}

pub(crate) struct CompleteLogin<'a> {
    pub(crate) student_id: &'a str,
    /// Device presented at login. Bound when the account has none yet.
    pub(crate) device_id: Option<&'a str>,
    pub(crate) activation: Option<Activation>,
    pub(crate) session_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

/// Persists a successful login: device binding, activation details, the new session id
/// replacing any earlier one, and a `login` activity.
///
/// Returns `None` without touching the row when another device is bound by the time the
/// update runs, or when the account is bound and no device was presented.
pub(crate) async fn complete_login(
    pool: &PgPool,
    params: CompleteLogin<'_>,
) -> Result<Option<Student>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (name, phone, parent_phone) = match params.activation {
        Some(activation) => {
            (Some(activation.name), Some(activation.phone), Some(activation.parent_phone))
        }
        None => (None, None, None),
    };
    let activated = name.is_some();

    let updated = sqlx::query(
        "UPDATE students SET
            device_id = COALESCE(device_id, $1),
            name = COALESCE($2, name),
            phone = COALESCE($3, phone),
            parent_phone = COALESCE($4, parent_phone),
            is_activated = is_activated OR $5,
            current_session_id = $6,
            last_login = $7,
            updated_at = $7
         WHERE id = $8
           AND (device_id IS NULL OR device_id = $1)",
    )
    .bind(params.device_id)
    .bind(name)
    .bind(phone)
    .bind(parent_phone)
    .bind(activated)
    .bind(params.session_id)
    .bind(params.now)
    .bind(params.student_id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    activities::insert(
        &mut *tx,
        NewActivity {
            student_id: params.student_id,
            action: ActivityAction::Login,
            target_id: None,
            details: None,
            logged_at: params.now,
        },
    )
    .await?;

    let student =
        sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
            .bind(params.student_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;
    Ok(Some(student))
}

/// Replaces whichever grant lists are supplied. Lists must already be de-duplicated.
pub(crate) async fn replace_grants(
    pool: &PgPool,
    id: &str,
    videos: Option<&[String]>,
    exams: Option<&[String]>,
    now: PrimitiveDateTime,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "UPDATE students SET
            accessible_videos = COALESCE($1, accessible_videos),
            accessible_exams = COALESCE($2, accessible_exams),
            updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(videos)
    .bind(exams)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}
