use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::format_primitive;
use crate::db::models::{Exam, Question};
use crate::db::types::Track;

pub(crate) const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamCreate {
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) title: String,
    #[validate(range(min = 1, max = 3, message = "grade must be 1, 2 or 3"))]
    pub(crate) grade: i32,
    #[serde(alias = "duration", alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(default = "default_attempts_allowed", alias = "attemptsAllowed")]
    #[validate(range(min = 1, message = "attempts_allowed must be positive"))]
    pub(crate) attempts_allowed: i32,
    #[serde(default = "default_true", alias = "isActive")]
    pub(crate) is_active: bool,
    #[serde(default)]
    pub(crate) track: Track,
    #[serde(default = "default_true", alias = "showResultImmediately")]
    pub(crate) show_result_immediately: bool,
    #[serde(default, alias = "driveLink")]
    pub(crate) drive_link: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 3, message = "grade must be 1, 2 or 3"))]
    pub(crate) grade: Option<i32>,
    #[serde(default, alias = "duration", alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default, alias = "attemptsAllowed")]
    #[validate(range(min = 1, message = "attempts_allowed must be positive"))]
    pub(crate) attempts_allowed: Option<i32>,
    #[serde(default, alias = "isActive")]
    pub(crate) is_active: Option<bool>,
    #[serde(default)]
    pub(crate) track: Option<Track>,
    #[serde(default, alias = "showResultImmediately")]
    pub(crate) show_result_immediately: Option<bool>,
    /// An empty string clears the stored link.
    #[serde(default, alias = "driveLink")]
    pub(crate) drive_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) grade: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) attempts_allowed: i32,
    pub(crate) is_active: bool,
    pub(crate) track: Track,
    pub(crate) show_result_immediately: bool,
    pub(crate) drive_link: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            grade: exam.grade,
            duration_minutes: exam.duration_minutes,
            attempts_allowed: exam.attempts_allowed,
            is_active: exam.is_active,
            track: exam.track,
            show_result_immediately: exam.show_result_immediately,
            drive_link: exam.drive_link,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) text: String,
    #[validate(length(equal = 4, message = "exactly 4 options are required"))]
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    #[validate(custom(function = "validate_correct_answer"))]
    pub(crate) correct_answer: String,
    #[serde(default = "default_points")]
    #[validate(range(min = 0, max = 1000, message = "points must be between 0 and 1000"))]
    pub(crate) points: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BulkQuestionsCreate {
    #[validate(length(min = 1, message = "questions must not be empty"), nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[validate(custom(function = "crate::api::validation::not_blank"))]
    pub(crate) text: Option<String>,
    #[serde(default)]
    #[validate(length(equal = 4, message = "exactly 4 options are required"))]
    pub(crate) options: Option<Vec<String>>,
    #[serde(default, alias = "correctAnswer")]
    #[validate(custom(function = "validate_correct_answer"))]
    pub(crate) correct_answer: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000, message = "points must be between 0 and 1000"))]
    pub(crate) points: Option<i32>,
}

/// Question as authored, answer key included. Admin only.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: String,
    pub(crate) points: i32,
    pub(crate) position: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            text: question.text,
            options: question.options,
            correct_answer: question.correct_answer,
            points: question.points,
            position: question.position,
            created_at: format_primitive(question.created_at),
            updated_at: format_primitive(question.updated_at),
        }
    }
}

/// Question as shown to a student taking the exam. Carries no answer key.
#[derive(Debug, Serialize)]
pub(crate) struct PublicQuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) points: i32,
    pub(crate) position: i32,
}

impl PublicQuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            text: question.text,
            options: question.options,
            points: question.points,
            position: question.position,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentExamResponse {
    pub(crate) exam: ExamResponse,
    pub(crate) questions: Vec<PublicQuestionResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmittedAnswerPayload {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default, alias = "selectedAnswer")]
    pub(crate) selected_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitExamRequest {
    #[serde(default)]
    pub(crate) answers: Vec<SubmittedAnswerPayload>,
}

fn validate_correct_answer(value: &str) -> Result<(), ValidationError> {
    let in_range = value
        .parse::<usize>()
        .map(|index| index < OPTIONS_PER_QUESTION && value.len() == 1)
        .unwrap_or(false);
    if in_range {
        Ok(())
    } else {
        let mut error = ValidationError::new("correct_answer");
        error.message = Some("correct_answer must be one of \"0\", \"1\", \"2\", \"3\"".into());
        Err(error)
    }
}

fn default_attempts_allowed() -> i32 {
    1
}

fn default_points() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: &str, options: usize) -> QuestionCreate {
        QuestionCreate {
            text: "2 + 2 = ?".to_string(),
            options: (0..options).map(|i| i.to_string()).collect(),
            correct_answer: correct.to_string(),
            points: 1,
        }
    }

    #[test]
    fn question_requires_four_options_and_index_answer() {
        assert!(question("3", 4).validate().is_ok());
        assert!(question("4", 4).validate().is_err());
        assert!(question("01", 4).validate().is_err());
        assert!(question("A", 4).validate().is_err());
        assert!(question("0", 3).validate().is_err());
    }

    #[test]
    fn blank_exam_title_fails_update_validation() {
        let update: ExamUpdate =
            serde_json::from_value(serde_json::json!({ "title": "   " })).expect("update");
        assert!(update.validate().is_err());

        let update: ExamUpdate =
            serde_json::from_value(serde_json::json!({ "driveLink": "" })).expect("update");
        assert!(update.validate().is_ok());
    }

    #[test]
    fn question_points_are_capped() {
        let mut capped = question("0", 4);
        capped.points = 1000;
        assert!(capped.validate().is_ok());
        capped.points = 1001;
        assert!(capped.validate().is_err());
        capped.points = i32::MAX;
        assert!(capped.validate().is_err());
    }

    #[test]
    fn bulk_validation_reaches_nested_questions() {
        let bulk = BulkQuestionsCreate { questions: vec![question("0", 4), question("9", 4)] };
        assert!(bulk.validate().is_err());
        assert!(BulkQuestionsCreate { questions: Vec::new() }.validate().is_err());
    }

    #[test]
    fn exam_create_accepts_original_key_names() {
        let exam: ExamCreate = serde_json::from_value(serde_json::json!({
            "title": "Algebra",
            "grade": 2,
            "duration": 45,
            "attemptsAllowed": 2,
            "track": "scientific"
        }))
        .expect("exam");
        assert_eq!(exam.duration_minutes, 45);
        assert_eq!(exam.attempts_allowed, 2);
        assert!(exam.is_active);
        assert!(exam.show_result_immediately);
        assert_eq!(exam.track, Track::Scientific);
    }

    #[test]
    fn submit_request_reads_camel_case_answers() {
        let request: SubmitExamRequest = serde_json::from_value(serde_json::json!({
            "answers": [{"questionId": "q1", "selectedAnswer": "2"}, {"questionId": "q2"}]
        }))
        .expect("submit");
        assert_eq!(request.answers[0].selected_answer.as_deref(), Some("2"));
        assert_eq!(request.answers[1].selected_answer, None);
    }

    #[test]
    fn public_question_omits_answer_key() {
        let now = crate::core::time::primitive_now_utc();
        let public = PublicQuestionResponse::from_db(Question {
            id: "q1".into(),
            exam_id: "e1".into(),
            text: "?".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "2".into(),
            points: 1,
            position: 0,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_value(public).unwrap();
        assert!(json.get("correct_answer").is_none());
        assert!(json.get("correctAnswer").is_none());
    }
}
