use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts, HeaderMap};

use crate::api::errors::ApiError;
use crate::core::security::{self, Claims, Role};
use crate::core::state::AppState;
use crate::db::models::{Admin, Student};
use crate::repositories;

pub(crate) const TOKEN_COOKIE: &str = "token";

pub(crate) struct CurrentStudent(pub(crate) Student);
pub(crate) struct CurrentAdmin(pub(crate) Admin);

/// Bearer header first, then the `token` cookie set at login.
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

async fn claims_from_parts(parts: &mut Parts, state: &AppState) -> Result<(AppState, Claims), ApiError> {
    let State(app_state) = State::<AppState>::from_request_parts(parts, state)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

    let token = extract_token(&parts.headers)
        .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

    let claims = security::verify_token(&token, app_state.settings())
        .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

    Ok((app_state, claims))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (app_state, claims) = claims_from_parts(parts, state).await?;
        if claims.role != Role::Student {
            return Err(ApiError::Forbidden("Student access required"));
        }

        let student = repositories::students::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student"))?
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        if !student.is_active {
            return Err(ApiError::Unauthorized("Account is disabled"));
        }
        if student.is_banned {
            return Err(ApiError::Forbidden("Account is banned"));
        }

        let session_matches = matches!(
            (claims.sid.as_deref(), student.current_session_id.as_deref()),
            (Some(presented), Some(current)) if presented == current
        );
        if !session_matches {
            return Err(ApiError::Unauthorized("Session expired, signed in on another device"));
        }

        Ok(CurrentStudent(student))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (app_state, claims) = claims_from_parts(parts, state).await?;
        if claims.role != Role::Admin {
            return Err(ApiError::Forbidden("Admin access required"));
        }

        let admin = repositories::admins::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load admin"))?
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(CurrentAdmin(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn token_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=xyz; lang=ar"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn missing_credentials_yield_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("tokenish=1"));
        assert_eq!(extract_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(extract_token(&headers), None);
    }
}
