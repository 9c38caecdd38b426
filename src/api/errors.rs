use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    needs_registration: Option<bool>,
}

impl ErrorResponse {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self { status: status.as_u16(), detail: detail.into(), code: None, needs_registration: None }
    }
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    /// Account is bound to another device.
    DeviceMismatch,
    /// First login must carry the student's name and phone numbers.
    NeedsRegistration,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response =
                    (status, Json(ErrorResponse::new(status, message))).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::DeviceMismatch => {
                let status = StatusCode::FORBIDDEN;
                let body = ErrorResponse {
                    code: Some("DEVICE_MISMATCH"),
                    ..ErrorResponse::new(
                        status,
                        "This account is bound to another device and cannot be used here",
                    )
                };
                (status, Json(body)).into_response()
            }
            ApiError::NeedsRegistration => {
                let status = StatusCode::FORBIDDEN;
                let body = ErrorResponse {
                    code: Some("NEEDS_REGISTRATION"),
                    needs_registration: Some(true),
                    ..ErrorResponse::new(status, "Complete your name and phone numbers first")
                };
                (status, Json(body)).into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::TooManyRequests(message) => {
                let status = StatusCode::TOO_MANY_REQUESTS;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse::new(status, message))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn device_mismatch_carries_error_code() {
        let (status, body) = body_of(ApiError::DeviceMismatch).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "DEVICE_MISMATCH");
        assert!(body.get("needs_registration").is_none());
    }

    #[tokio::test]
    async fn needs_registration_sets_flag() {
        let (status, body) = body_of(ApiError::NeedsRegistration).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["needs_registration"], true);
        assert_eq!(body["code"], "NEEDS_REGISTRATION");
    }

    #[tokio::test]
    async fn plain_errors_have_no_code() {
        let (status, body) = body_of(ApiError::NotFound("Exam not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Exam not found");
        assert!(body.get("code").is_none());
    }
}
