use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use time::PrimitiveDateTime;

use crate::api::errors::ApiError;
use crate::api::guards::TOKEN_COOKIE;
use crate::api::validation::{non_blank, validate_payload};
use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Student;
use crate::core::{metrics, redis::login_rate_key, security};
use crate::repositories;
use crate::repositories::students::{Activation, CompleteLogin};
use crate::schemas::auth::{
    AdminLoginRequest, AdminResponse, AdminTokenResponse, StudentLoginRequest,
    StudentTokenResponse,
};
use crate::schemas::student::StudentProfileResponse;
use crate::services::access_codes::generate_session_id;
use crate::services::device_policy::{self, DeviceDecision};

pub(crate) const DEVICE_ID_HEADER: &str = "x-device-id";
const AUTO_BAN_REASON: &str = "Repeated sign-in attempts from an unrecognised device";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login/student", post(login_student))
        .route("/login/admin", post(login_admin))
}

async fn login_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<StudentLoginRequest>,
) -> Result<Response, ApiError> {
    validate_payload(&payload)?;
    let code = payload.code.trim().to_string();

    if !within_login_limit(&state, &login_rate_key(&code)).await {
        metrics::record_login("rate_limited");
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let student = repositories::students::find_enabled_by_code(state.db(), &code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| {
            metrics::record_login("unknown_code");
            ApiError::NotFound("Invalid code or account disabled".to_string())
        })?;

    if student.is_banned {
        metrics::record_login("banned");
        return Err(ApiError::Forbidden("Account is banned"));
    }

    let presented_device = non_blank(payload.device_id).or_else(|| {
        non_blank(
            headers
                .get(DEVICE_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        )
    });
    let now = primitive_now_utc();

    let device =
        match device_policy::evaluate(student.device_id.as_deref(), presented_device.as_deref()) {
            DeviceDecision::Bind(device) => Some(device),
            DeviceDecision::Proceed => presented_device,
            DeviceDecision::Mismatch => return Err(reject_device(&state, &student, now).await),
        };

    let activation = if student.is_activated {
        None
    } else {
        match (non_blank(payload.name), non_blank(payload.phone), non_blank(payload.parent_phone)) {
            (Some(name), Some(phone), Some(parent_phone)) => {
                Some(Activation { name, phone, parent_phone })
            }
            _ => {
                metrics::record_login("needs_registration");
                return Err(ApiError::NeedsRegistration);
            }
        }
    };

    let session_id = generate_session_id();
    let completed = repositories::students::complete_login(
        state.db(),
        CompleteLogin {
            student_id: &student.id,
            device_id: device.as_deref(),
            activation,
            session_id: &session_id,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record login"))?;
    let Some(student) = completed else {
        return Err(reject_device(&state, &student, now).await);
    };

    let token = security::create_student_token(&student.id, &session_id, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;
    let cookie = token_cookie(
        &token,
        state.settings().security().student_token_expire_minutes,
        state.settings(),
    )?;

    tracing::info!(student_id = %student.id, "Student signed in");
    metrics::record_login("success");

    let body = StudentTokenResponse {
        token,
        token_type: "bearer".to_string(),
        student: StudentProfileResponse::from_db(student),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Counts the mismatch, bans when the threshold is reached and yields the error to return.
async fn reject_device(state: &AppState, student: &Student, now: PrimitiveDateTime) -> ApiError {
    let ban = device_policy::should_ban(
        student.device_mismatch_attempts + 1,
        state.settings().policy().device_mismatch_ban_threshold,
    );
    let updated = match repositories::students::record_device_mismatch(
        state.db(),
        &student.id,
        ban.then_some(AUTO_BAN_REASON),
        now,
    )
    .await
    {
        Ok(updated) => updated,
        Err(e) => return ApiError::internal(e, "Failed to record device mismatch"),
    };

    tracing::warn!(
        student_id = %updated.id,
        attempts = updated.device_mismatch_attempts,
        banned = updated.is_banned,
        "Student login from unrecognised device"
    );
    metrics::record_login("device_mismatch");
    ApiError::DeviceMismatch
}

async fn login_admin(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Response, ApiError> {
    validate_payload(&payload)?;
    let username = payload.username.trim();

    if !within_login_limit(&state, &format!("rl:login:admin:{username}")).await {
        return Err(ApiError::TooManyRequests("Too many login attempts, try again later"));
    }

    let admin = repositories::admins::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load admin"))?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;

    let verified = security::verify_password(&payload.password, &admin.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = security::create_admin_token(&admin.id, state.settings())
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;
    let cookie =
        token_cookie(&token, state.settings().security().admin_token_expire_minutes, state.settings())?;

    let body = AdminTokenResponse {
        token,
        token_type: "bearer".to_string(),
        admin: AdminResponse::from_db(admin),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

async fn within_login_limit(state: &AppState, key: &str) -> bool {
    let policy = state.settings().policy();
    match state
        .redis()
        .rate_limit(key, policy.login_rate_limit, policy.login_rate_window_seconds)
        .await
    {
        Ok(allowed) => allowed,
        Err(err) => {
            tracing::warn!(error = %err, "Login rate limit check failed; allowing attempt");
            true
        }
    }
}

fn token_cookie(
    token: &str,
    expire_minutes: u64,
    settings: &Settings,
) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        expire_minutes.saturating_mul(60)
    );
    if settings.security().secure_cookies {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).map_err(|e| ApiError::internal(e, "Failed to build cookie"))
}
