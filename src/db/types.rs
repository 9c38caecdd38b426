use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Academic specialization a student follows and content is tagged with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "track", rename_all = "lowercase")]
pub(crate) enum Track {
    #[default]
    General,
    Scientific,
    Literary,
}

impl Track {
    /// First-year students have not chosen a specialization yet.
    pub(crate) fn for_grade(grade: i32, requested: Track) -> Track {
        if grade == 1 {
            Track::General
        } else {
            requested
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "activityaction", rename_all = "snake_case")]
pub(crate) enum ActivityAction {
    Login,
    ViewVideo,
    StartExam,
    SubmitExam,
    Heartbeat,
}

impl ActivityAction {
    pub(crate) fn refreshes_last_active(self) -> bool {
        !matches!(self, Self::Heartbeat)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "videosource", rename_all = "lowercase")]
pub(crate) enum VideoSource {
    #[default]
    Youtube,
    Dailymotion,
}

/// Graded answer for one question, stored inside a result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AnswerRecord {
    pub(crate) question_id: String,
    pub(crate) selected_answer: Option<String>,
    pub(crate) is_correct: bool,
}

pub(crate) const MIN_GRADE: i32 = 1;
pub(crate) const MAX_GRADE: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_grade_is_forced_to_general_track() {
        assert_eq!(Track::for_grade(1, Track::Scientific), Track::General);
        assert_eq!(Track::for_grade(2, Track::Scientific), Track::Scientific);
        assert_eq!(Track::for_grade(3, Track::Literary), Track::Literary);
    }

    #[test]
    fn heartbeat_does_not_refresh_last_active() {
        assert!(!ActivityAction::Heartbeat.refreshes_last_active());
        assert!(ActivityAction::ViewVideo.refreshes_last_active());
        assert!(ActivityAction::SubmitExam.refreshes_last_active());
    }

    #[test]
    fn activity_action_uses_snake_case_on_the_wire() {
        let parsed: ActivityAction = serde_json::from_str("\"view_video\"").unwrap();
        assert_eq!(parsed, ActivityAction::ViewVideo);
        assert_eq!(serde_json::to_string(&ActivityAction::StartExam).unwrap(), "\"start_exam\"");
    }
}
