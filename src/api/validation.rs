use validator::{Validate, ValidationError};

use crate::api::errors::ApiError;
use crate::db::types::{MAX_GRADE, MIN_GRADE};

pub(crate) fn validate_payload(payload: &impl Validate) -> Result<(), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub(crate) fn validate_grade(grade: i32) -> Result<(), ApiError> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("grade must be between {MIN_GRADE} and {MAX_GRADE}")))
    }
}

/// Trims the value and maps blank strings to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|item| item.trim().to_string()).filter(|item| !item.is_empty())
}

/// Rejects strings that are empty once surrounding whitespace is trimmed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.message = Some("must not be blank".into());
        Err(error)
    } else {
        Ok(())
    }
}
