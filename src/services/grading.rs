//! Scoring of multiple-choice submissions.

use crate::db::models::Question;
use crate::db::types::AnswerRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SubmittedAnswer {
    pub(crate) question_id: String,
    pub(crate) selected_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GradedExam {
    pub(crate) score: i32,
    pub(crate) total_points: i32,
    pub(crate) answers: Vec<AnswerRecord>,
}

/// Grades `submitted` against the exam's questions.
///
/// Every question contributes its points to `total_points`. The first submitted answer carrying
/// the question's id is compared with the stored correct answer by exact string equality.
/// Unanswered questions are recorded with a null answer, answers to unknown question ids are
/// ignored. Sums saturate at `i32::MAX`.
pub(crate) fn grade(questions: &[Question], submitted: &[SubmittedAnswer]) -> GradedExam {
    let mut score: i32 = 0;
    let mut total_points: i32 = 0;
    let mut answers = Vec::with_capacity(questions.len());

    for question in questions {
        total_points = total_points.saturating_add(question.points);

        let selected_answer = submitted
            .iter()
            .find(|answer| answer.question_id == question.id)
            .and_then(|answer| answer.selected_answer.clone());

        let is_correct = selected_answer.as_deref() == Some(question.correct_answer.as_str());
        if is_correct {
            score = score.saturating_add(question.points);
        }

        answers.push(AnswerRecord { question_id: question.id.clone(), selected_answer, is_correct });
    }

    GradedExam { score, total_points, answers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn question(id: &str, correct: &str, points: i32) -> Question {
        let now = primitive_now_utc();
        Question {
            id: id.to_string(),
            exam_id: "exam-1".to_string(),
            text: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct.to_string(),
            points,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn answer(question_id: &str, selected: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: question_id.to_string(),
            selected_answer: Some(selected.to_string()),
        }
    }

    #[test]
    fn scores_correct_answers_and_totals_all_points() {
        let questions = vec![question("q1", "0", 1), question("q2", "2", 1)];
        let graded = grade(&questions, &[answer("q1", "0"), answer("q2", "1")]);

        assert_eq!(graded.score, 1);
        assert_eq!(graded.total_points, 2);
        assert!(graded.answers[0].is_correct);
        assert!(!graded.answers[1].is_correct);
        assert_eq!(graded.answers[1].selected_answer.as_deref(), Some("1"));
    }

    #[test]
    fn omitted_question_is_incorrect_with_null_answer() {
        let questions = vec![question("q1", "3", 2), question("q2", "1", 5)];
        let graded = grade(&questions, &[answer("q1", "3")]);

        assert_eq!(graded.score, 2);
        assert_eq!(graded.total_points, 7);
        assert_eq!(graded.answers[1].selected_answer, None);
        assert!(!graded.answers[1].is_correct);
    }

    #[test]
    fn foreign_question_ids_have_no_effect() {
        let questions = vec![question("q1", "1", 1)];
        let with_foreign = grade(&questions, &[answer("q1", "1"), answer("other", "1")]);
        let without = grade(&questions, &[answer("q1", "1")]);

        assert_eq!(with_foreign, without);
        assert_eq!(with_foreign.answers.len(), 1);
    }

    #[test]
    fn first_answer_for_a_question_wins() {
        let questions = vec![question("q1", "2", 1)];
        let graded = grade(&questions, &[answer("q1", "0"), answer("q1", "2")]);

        assert_eq!(graded.score, 0);
        assert_eq!(graded.answers[0].selected_answer.as_deref(), Some("0"));
    }

    #[test]
    fn comparison_is_exact_string_equality() {
        let questions = vec![question("q1", "1", 1)];
        let graded = grade(&questions, &[answer("q1", " 1")]);
        assert_eq!(graded.score, 0);
    }

    #[test]
    fn zero_point_questions_count_but_add_nothing() {
        let questions = vec![question("q1", "0", 0), question("q2", "0", 3)];
        let graded = grade(&questions, &[answer("q1", "0"), answer("q2", "0")]);
        assert_eq!(graded.score, 3);
        assert_eq!(graded.total_points, 3);
        assert!(graded.answers.iter().all(|record| record.is_correct));
    }

    #[test]
    fn huge_point_values_saturate_instead_of_overflowing() {
        let questions = vec![question("q1", "0", i32::MAX), question("q2", "0", i32::MAX)];
        let graded = grade(&questions, &[answer("q1", "0"), answer("q2", "0")]);
        assert_eq!(graded.total_points, i32::MAX);
        assert_eq!(graded.score, i32::MAX);
    }

    #[test]
    fn empty_exam_grades_to_zero() {
        let graded = grade(&[], &[answer("q1", "0")]);
        assert_eq!(graded, GradedExam { score: 0, total_points: 0, answers: Vec::new() });
    }
}
