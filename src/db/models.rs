use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{ActivityAction, AnswerRecord, Track, VideoSource};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) code: String,
    pub(crate) name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) parent_phone: Option<String>,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) is_activated: bool,
    pub(crate) current_session_id: Option<String>,
    pub(crate) device_id: Option<String>,
    pub(crate) device_mismatch_attempts: i32,
    pub(crate) last_device_mismatch: Option<PrimitiveDateTime>,
    pub(crate) is_banned: bool,
    pub(crate) ban_reason: Option<String>,
    pub(crate) is_subscribed: bool,
    pub(crate) subscription_expiry: Option<PrimitiveDateTime>,
    pub(crate) last_login: Option<PrimitiveDateTime>,
    pub(crate) last_active: Option<PrimitiveDateTime>,
    pub(crate) is_active: bool,
    pub(crate) accessible_videos: Vec<String>,
    pub(crate) accessible_exams: Vec<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Student {
    pub(crate) fn can_access_exam(&self, exam_id: &str) -> bool {
        self.accessible_exams.iter().any(|granted| granted == exam_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Admin {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) grade: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) attempts_allowed: i32,
    pub(crate) is_active: bool,
    pub(crate) track: Track,
    pub(crate) show_result_immediately: bool,
    pub(crate) drive_link: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) points: i32,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExamResult {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) exam_id: String,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) answers: Json<Vec<AnswerRecord>>,
    pub(crate) submitted_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Activity {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) action: ActivityAction,
    pub(crate) target_id: Option<String>,
    pub(crate) details: Option<Json<serde_json::Value>>,
    pub(crate) logged_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct Video {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) grade: i32,
    pub(crate) track: Track,
    pub(crate) dailymotion_id: String,
    pub(crate) unit: Option<String>,
    pub(crate) lesson: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct FreeVideo {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) youtube_id: String,
    pub(crate) description: Option<String>,
    pub(crate) source_type: VideoSource,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}
