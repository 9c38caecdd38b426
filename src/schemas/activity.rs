use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Activity;
use crate::db::types::ActivityAction;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ActivityCreate {
    pub(crate) action: ActivityAction,
    #[serde(default, alias = "targetId")]
    #[validate(length(max = 36, message = "target_id must be at most 36 characters"))]
    pub(crate) target_id: Option<String>,
    #[serde(default)]
    pub(crate) details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActivityResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) action: ActivityAction,
    pub(crate) target_id: Option<String>,
    pub(crate) details: Option<serde_json::Value>,
    pub(crate) timestamp: String,
}

impl ActivityResponse {
    pub(crate) fn from_db(activity: Activity) -> Self {
        Self {
            id: activity.id,
            student_id: activity.student_id,
            action: activity.action,
            target_id: activity.target_id,
            details: activity.details.map(|details| details.0),
            timestamp: format_primitive(activity.logged_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ActivityLoggedResponse {
    pub(crate) success: bool,
    pub(crate) id: String,
}
