use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Admin;
use crate::schemas::student::StudentProfileResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentLoginRequest {
    #[validate(length(min = 1, max = 64, message = "code must not be empty"))]
    pub(crate) code: String,
    #[serde(default, alias = "deviceId")]
    pub(crate) device_id: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32, message = "phone must be at most 32 characters"))]
    pub(crate) phone: Option<String>,
    #[serde(default, alias = "parentPhone")]
    #[validate(length(max = 32, message = "parent_phone must be at most 32 characters"))]
    pub(crate) parent_phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminLoginRequest {
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub(crate) username: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentTokenResponse {
    pub(crate) token: String,
    pub(crate) token_type: String,
    pub(crate) student: StudentProfileResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminResponse {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AdminResponse {
    pub(crate) fn from_db(admin: Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username,
            created_at: format_primitive(admin.created_at),
            updated_at: format_primitive(admin.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminTokenResponse {
    pub(crate) token: String,
    pub(crate) token_type: String,
    pub(crate) admin: AdminResponse,
}
