use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::Track;
use crate::repositories;
use crate::test_support;

#[tokio::test]
async fn submission_is_graded_and_persisted() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "GRAD0001", 2, Track::General).await;
    let exam = test_support::insert_exam(ctx.state.db(), "Algebra", 2).await;
    let q1 = test_support::insert_question(ctx.state.db(), &exam.id, "0", 1).await;
    let q2 = test_support::insert_question(ctx.state.db(), &exam.id, "2", 1).await;
    test_support::grant(ctx.state.db(), &student.id, &[], &[exam.id.clone()]).await;
    let token = test_support::student_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/student/exams/{}/submit", exam.id),
            Some(&token),
            Some(json!({
                "answers": [
                    { "questionId": q1.id, "selectedAnswer": "0" },
                    { "questionId": q2.id, "selectedAnswer": "1" },
                    { "questionId": "not-in-exam", "selectedAnswer": "3" },
                ]
            })),
        ))
        .await
        .expect("submit");

    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["score"], 1);
    assert_eq!(body["total_points"], 2);
    let answers = body["answers"].as_array().expect("answers");
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["question_id"], q1.id.as_str());
    assert_eq!(answers[0]["is_correct"], true);
    assert_eq!(answers[1]["question_id"], q2.id.as_str());
    assert_eq!(answers[1]["selected_answer"], "1");
    assert_eq!(answers[1]["is_correct"], false);

    let stored = repositories::results::list_by_student(ctx.state.db(), &student.id)
        .await
        .expect("results");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].score, 1);

    let activities = repositories::activities::list_by_student(ctx.state.db(), &student.id, 10)
        .await
        .expect("activities");
    assert!(activities
        .iter()
        .any(|activity| activity.action == crate::db::types::ActivityAction::SubmitExam));
}

#[tokio::test]
async fn omitted_answers_are_recorded_as_incorrect() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "OMIT0001", 1, Track::General).await;
    let exam = test_support::insert_exam(ctx.state.db(), "Physics", 1).await;
    test_support::insert_question(ctx.state.db(), &exam.id, "1", 2).await;
    test_support::insert_question(ctx.state.db(), &exam.id, "3", 3).await;
    test_support::grant(ctx.state.db(), &student.id, &[], &[exam.id.clone()]).await;
    let token = test_support::student_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/student/exams/{}/submit", exam.id),
            Some(&token),
            Some(json!({ "answers": [] })),
        ))
        .await
        .expect("submit");

    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["score"], 0);
    assert_eq!(body["total_points"], 5);
    for answer in body["answers"].as_array().expect("answers") {
        assert!(answer["selected_answer"].is_null());
        assert_eq!(answer["is_correct"], false);
    }
}

#[tokio::test]
async fn attempts_limit_blocks_extra_submissions() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "ATTM0001", 3, Track::General).await;
    let exam = test_support::insert_exam(ctx.state.db(), "Chemistry", 3).await;
    test_support::insert_question(ctx.state.db(), &exam.id, "0", 1).await;
    test_support::grant(ctx.state.db(), &student.id, &[], &[exam.id.clone()]).await;
    let token = test_support::student_token(&ctx.state, &student).await;

    let uri = format!("/api/student/exams/{}/submit", exam.id);
    for expected in [StatusCode::OK, StatusCode::FORBIDDEN] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(&token),
                Some(json!({ "answers": [] })),
            ))
            .await
            .expect("submit");
        assert_eq!(response.status(), expected);
    }

    let stored = repositories::results::list_by_student(ctx.state.db(), &student.id)
        .await
        .expect("results");
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn exam_fetch_requires_grant_active_and_grade() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "FETC0001", 2, Track::General).await;
    let granted = test_support::insert_exam(ctx.state.db(), "Granted", 2).await;
    let ungranted = test_support::insert_exam(ctx.state.db(), "Ungranted", 2).await;
    let other_grade = test_support::insert_exam(ctx.state.db(), "Other grade", 3).await;
    let inactive = test_support::insert_exam(ctx.state.db(), "Inactive", 2).await;
    sqlx::query("UPDATE exams SET is_active = FALSE WHERE id = $1")
        .bind(&inactive.id)
        .execute(ctx.state.db())
        .await
        .expect("deactivate");
    let first = test_support::insert_question(ctx.state.db(), &granted.id, "2", 1).await;
    let second = test_support::insert_question(ctx.state.db(), &granted.id, "0", 1).await;

    test_support::grant(
        ctx.state.db(),
        &student.id,
        &[],
        &[
            granted.id.clone(),
            other_grade.id.clone(),
            inactive.id.clone(),
            "missing-exam".to_string(),
        ],
    )
    .await;
    let token = test_support::student_token(&ctx.state, &student).await;

    for exam_id in [ungranted.id.as_str(), other_grade.id.as_str(), inactive.id.as_str(), "missing-exam"] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/student/exams/{exam_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("fetch");
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "exam {exam_id}");
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/student/exams/{}", granted.id),
            Some(&token),
            None,
        ))
        .await
        .expect("fetch granted");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["exam"]["title"], "Granted");
    let questions = body["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["id"], first.id.as_str());
    assert_eq!(questions[1]["id"], second.id.as_str());
    for question in questions {
        assert!(question.get("correct_answer").is_none());
        assert_eq!(question["options"].as_array().map(Vec::len), Some(4));
    }
}

#[tokio::test]
async fn listings_only_show_granted_content() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "LIST0001", 1, Track::General).await;
    let v1 = test_support::insert_video(ctx.state.db(), "v1", 1).await;
    test_support::insert_video(ctx.state.db(), "v2", 1).await;
    let exam = test_support::insert_exam(ctx.state.db(), "Visible", 1).await;
    test_support::insert_exam(ctx.state.db(), "Hidden", 1).await;
    test_support::grant(
        ctx.state.db(),
        &student.id,
        &[v1.id.clone()],
        &[exam.id.clone()],
    )
    .await;
    let token = test_support::student_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/student/videos", Some(&token), None))
        .await
        .expect("videos");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let videos = body.as_array().expect("videos");
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["id"], v1.id.as_str());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/student/exams", Some(&token), None))
        .await
        .expect("exams");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let exams = body.as_array().expect("exams");
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0]["title"], "Visible");
}

#[tokio::test]
async fn results_include_exam_title() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "HIST0001", 2, Track::General).await;
    let exam = test_support::insert_exam(ctx.state.db(), "History", 2).await;
    test_support::insert_question(ctx.state.db(), &exam.id, "1", 4).await;
    test_support::grant(ctx.state.db(), &student.id, &[], &[exam.id.clone()]).await;
    let token = test_support::student_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/student/exams/{}/submit", exam.id),
            Some(&token),
            Some(json!({ "answers": [] })),
        ))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/student/results", Some(&token), None))
        .await
        .expect("results");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    let results = body.as_array().expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["exam_title"], "History");
    assert_eq!(results[0]["total_points"], 4);
}

#[tokio::test]
async fn heartbeat_does_not_refresh_last_active() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "BEAT0001", 1, Track::General).await;
    let token = test_support::student_token(&ctx.state, &student).await;
    sqlx::query("UPDATE students SET last_active = NULL WHERE id = $1")
        .bind(&student.id)
        .execute(ctx.state.db())
        .await
        .expect("clear last_active");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/student/activity/log",
            Some(&token),
            Some(json!({ "action": "heartbeat" })),
        ))
        .await
        .expect("heartbeat");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = test_support::read_json(response).await;
    assert_eq!(body["success"], true);

    let stored = repositories::students::find_by_id(ctx.state.db(), &student.id)
        .await
        .expect("load")
        .expect("student");
    assert!(stored.last_active.is_none());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/student/activity/log",
            Some(&token),
            Some(json!({ "action": "view_video", "targetId": "video-1", "details": { "seconds": 12 } })),
        ))
        .await
        .expect("view video");
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = repositories::students::find_by_id(ctx.state.db(), &student.id)
        .await
        .expect("load")
        .expect("student");
    assert!(stored.last_active.is_some());

    let activities = repositories::activities::list_by_student(ctx.state.db(), &student.id, 10)
        .await
        .expect("activities");
    let view = activities
        .iter()
        .find(|activity| activity.action == crate::db::types::ActivityAction::ViewVideo)
        .expect("view activity");
    assert_eq!(view.target_id.as_deref(), Some("video-1"));
}

#[tokio::test]
async fn unknown_activity_action_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "ACTV0001", 1, Track::General).await;
    let token = test_support::student_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/student/activity/log",
            Some(&token),
            Some(json!({ "action": "dance" })),
        ))
        .await
        .expect("log");
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn oversized_activity_target_is_a_bad_request() {
    let ctx = test_support::setup_test_context().await;
    let student = test_support::insert_student(ctx.state.db(), "ACTV0002", 1, Track::General).await;
    let token = test_support::student_token(&ctx.state, &student).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/student/activity/log",
            Some(&token),
            Some(json!({ "action": "view_video", "targetId": "v".repeat(37) })),
        ))
        .await
        .expect("log");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/student/activity/log",
            Some(&token),
            Some(json!({ "action": "view_video", "targetId": "v".repeat(36) })),
        ))
        .await
        .expect("log");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn student_routes_require_token() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/student/profile", None, None))
        .await
        .expect("profile");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
