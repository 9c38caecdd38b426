use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};
use validator::Validate;

use crate::api::pagination::default_limit;
use crate::core::time::{format_optional, format_primitive};
use crate::db::models::Student;
use crate::db::types::Track;
use crate::schemas::activity::ActivityResponse;

/// Full account view for admins.
#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) parent_phone: Option<String>,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) is_activated: bool,
    pub(crate) device_id: Option<String>,
    pub(crate) device_mismatch_attempts: i32,
    pub(crate) last_device_mismatch: Option<String>,
    pub(crate) is_banned: bool,
    pub(crate) ban_reason: Option<String>,
    pub(crate) is_subscribed: bool,
    pub(crate) subscription_expiry: Option<String>,
    pub(crate) last_login: Option<String>,
    pub(crate) last_active: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) accessible_videos: Vec<String>,
    pub(crate) accessible_exams: Vec<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(student: Student) -> Self {
        Self {
            id: student.id,
            code: student.code,
            name: student.name,
            phone: student.phone,
            parent_phone: student.parent_phone,
            grade: student.grade,
            track: student.track,
            is_activated: student.is_activated,
            device_id: student.device_id,
            device_mismatch_attempts: student.device_mismatch_attempts,
            last_device_mismatch: format_optional(student.last_device_mismatch),
            is_banned: student.is_banned,
            ban_reason: student.ban_reason,
            is_subscribed: student.is_subscribed,
            subscription_expiry: format_optional(student.subscription_expiry),
            last_login: format_optional(student.last_login),
            last_active: format_optional(student.last_active),
            is_active: student.is_active,
            accessible_videos: student.accessible_videos,
            accessible_exams: student.accessible_exams,
            created_at: format_primitive(student.created_at),
            updated_at: format_primitive(student.updated_at),
        }
    }
}

/// What a student sees about their own account. Session and device internals stay server side.
#[derive(Debug, Serialize)]
pub(crate) struct StudentProfileResponse {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) parent_phone: Option<String>,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) is_activated: bool,
    pub(crate) is_subscribed: bool,
    pub(crate) subscription_expiry: Option<String>,
    pub(crate) last_login: Option<String>,
    pub(crate) accessible_videos: Vec<String>,
    pub(crate) accessible_exams: Vec<String>,
}

impl StudentProfileResponse {
    pub(crate) fn from_db(student: Student) -> Self {
        Self {
            id: student.id,
            code: student.code,
            name: student.name,
            phone: student.phone,
            parent_phone: student.parent_phone,
            grade: student.grade,
            track: student.track,
            is_activated: student.is_activated,
            is_subscribed: student.is_subscribed,
            subscription_expiry: format_optional(student.subscription_expiry),
            last_login: format_optional(student.last_login),
            accessible_videos: student.accessible_videos,
            accessible_exams: student.accessible_exams,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentCreate {
    #[serde(default)]
    #[validate(length(min = 4, max = 64, message = "code must be 4 to 64 characters"))]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub(crate) phone: Option<String>,
    #[serde(default, alias = "parentPhone")]
    #[validate(length(max = 32, message = "parent_phone must be at most 32 characters"))]
    pub(crate) parent_phone: Option<String>,
    #[validate(range(min = 1, max = 3, message = "grade must be 1, 2 or 3"))]
    pub(crate) grade: i32,
    #[serde(default)]
    pub(crate) track: Track,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GenerateStudentsRequest {
    #[validate(range(min = 1, message = "count must be positive"))]
    pub(crate) count: u32,
    #[validate(range(min = 1, max = 3, message = "grade must be 1, 2 or 3"))]
    pub(crate) grade: i32,
    #[serde(default)]
    pub(crate) track: Track,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub(crate) phone: Option<String>,
    #[serde(default, alias = "parentPhone")]
    #[validate(length(max = 32, message = "parent_phone must be at most 32 characters"))]
    pub(crate) parent_phone: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 3, message = "grade must be 1, 2 or 3"))]
    pub(crate) grade: Option<i32>,
    #[serde(default)]
    pub(crate) track: Option<Track>,
    #[serde(default, alias = "isSubscribed")]
    pub(crate) is_subscribed: Option<bool>,
    #[serde(
        default,
        alias = "subscriptionExpiry",
        deserialize_with = "deserialize_option_date_flexible"
    )]
    pub(crate) subscription_expiry: Option<OffsetDateTime>,
    #[serde(default, alias = "isBanned")]
    pub(crate) is_banned: Option<bool>,
    #[serde(default, alias = "banReason")]
    pub(crate) ban_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermissionsUpdate {
    #[serde(default, alias = "accessibleVideos")]
    pub(crate) accessible_videos: Option<Vec<String>>,
    #[serde(default, alias = "accessibleExams")]
    pub(crate) accessible_exams: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentListQuery {
    #[serde(default)]
    pub(crate) grade: Option<i32>,
    #[serde(default)]
    pub(crate) track: Option<Track>,
    #[serde(default)]
    pub(crate) search: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentActivityResponse {
    pub(crate) student: StudentResponse,
    pub(crate) activities: Vec<ActivityResponse>,
}

// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as midnight UTC).
fn parse_date_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    Date::parse(raw, &format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn deserialize_option_date_flexible<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_date_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {value}")))
            .map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_update_accepts_camel_case_and_plain_dates() {
        let update: StudentUpdate = serde_json::from_value(serde_json::json!({
            "parentPhone": "0100",
            "isSubscribed": true,
            "subscriptionExpiry": "2026-09-01"
        }))
        .expect("update");

        assert_eq!(update.parent_phone.as_deref(), Some("0100"));
        assert_eq!(update.is_subscribed, Some(true));
        let expiry = update.subscription_expiry.expect("expiry");
        assert_eq!(expiry.year(), 2026);
        assert_eq!(expiry.hour(), 0);
    }

    #[test]
    fn phone_numbers_are_length_limited() {
        let update: StudentUpdate =
            serde_json::from_value(serde_json::json!({ "phone": "1".repeat(33) })).expect("update");
        assert!(update.validate().is_err());

        let update: StudentUpdate =
            serde_json::from_value(serde_json::json!({ "parentPhone": "1".repeat(32) }))
                .expect("update");
        assert!(update.validate().is_ok());
    }

    #[test]
    fn permissions_update_accepts_both_key_styles() {
        let camel: PermissionsUpdate =
            serde_json::from_value(serde_json::json!({"accessibleExams": ["e1"]})).unwrap();
        assert_eq!(camel.accessible_exams, Some(vec!["e1".to_string()]));
        assert!(camel.accessible_videos.is_none());

        let snake: PermissionsUpdate =
            serde_json::from_value(serde_json::json!({"accessible_videos": []})).unwrap();
        assert_eq!(snake.accessible_videos, Some(Vec::new()));
    }

    #[test]
    fn generate_request_rejects_out_of_range_grade() {
        let request = GenerateStudentsRequest { count: 3, grade: 4, track: Track::General };
        assert!(request.validate().is_err());
    }
}
