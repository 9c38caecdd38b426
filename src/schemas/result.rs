use serde::{Deserialize, Serialize};

use crate::api::pagination::default_limit;
use crate::core::time::format_primitive;
use crate::db::models::ExamResult;
use crate::db::types::AnswerRecord;
use crate::repositories::results::ResultSummaryRow;

#[derive(Debug, Serialize)]
pub(crate) struct ResultResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) exam_id: String,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) answers: Vec<AnswerRecord>,
    pub(crate) submitted_at: String,
}

impl ResultResponse {
    pub(crate) fn from_db(result: ExamResult) -> Self {
        Self {
            id: result.id,
            student_id: result.student_id,
            exam_id: result.exam_id,
            score: result.score,
            total_points: result.total_points,
            answers: result.answers.0,
            submitted_at: format_primitive(result.submitted_at),
        }
    }
}

/// A student's own result with the exam title attached.
#[derive(Debug, Serialize)]
pub(crate) struct StudentResultResponse {
    #[serde(flatten)]
    pub(crate) result: ResultResponse,
    pub(crate) exam_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultSummaryResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_code: String,
    pub(crate) student_name: Option<String>,
    pub(crate) exam_id: String,
    pub(crate) exam_title: String,
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) submitted_at: String,
}

impl ResultSummaryResponse {
    pub(crate) fn from_row(row: ResultSummaryRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            student_code: row.student_code,
            student_name: row.student_name,
            exam_id: row.exam_id,
            exam_title: row.exam_title,
            score: row.score,
            total_points: row.total_points,
            submitted_at: format_primitive(row.submitted_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultListQuery {
    #[serde(default, alias = "examId")]
    pub(crate) exam_id: Option<String>,
    #[serde(default, alias = "studentId")]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}
