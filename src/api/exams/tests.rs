use axum::http::{Method, StatusCode};
use serde_json::json;
use time::Duration;
use tower::ServiceExt;

use crate::core::time::primitive_now_utc;
use crate::services::catalog::ExamCatalog;
use crate::test_support::{self, exam_starting_at, question};

fn exam_payload(counts: serde_json::Value) -> serde_json::Value {
    json!({
        "name": "Algebra midterm",
        "start_date": "2030-03-01T09:00:00Z",
        "end_date": "2030-03-01T11:00:00Z",
        "time_to_solve_minutes": 90,
        "filters": [{"theme_filters": [{"theme": {"id": "T", "name": "Algebra"}, "counts": counts}]}]
    })
}

fn seed_theme_t(catalog: &test_support::MemoryCatalog) {
    for id in ["t-5a", "t-5b", "t-5c"] {
        catalog.add_question(question(id, "T", 5));
    }
    for id in ["t-10a", "t-10b"] {
        catalog.add_question(question(id, "T", 10));
    }
}

#[tokio::test]
async fn teacher_creates_exam_from_filters() {
    let ctx = test_support::setup_test_context().await;
    seed_theme_t(&ctx.catalog);
    let token = test_support::bearer_token("teacher-1", &["teacher"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(exam_payload(json!({"5": 2, "10": 2}))),
        ))
        .await
        .expect("create exam");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["question_count"], 4);

    let exam_id = created["exam_id"].as_str().expect("exam id");
    let stored = ctx.catalog.find_exam(exam_id).await.expect("find").expect("stored");
    assert_eq!(stored.creator, "teacher-1");
    assert_eq!(stored.questions.len(), 4);
}

#[tokio::test]
async fn shortfall_is_bad_request_and_persists_nothing() {
    let ctx = test_support::setup_test_context().await;
    seed_theme_t(&ctx.catalog);
    let token = test_support::bearer_token("teacher-1", &["teacher"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(exam_payload(json!({"10": 3}))),
        ))
        .await
        .expect("create exam");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
    let detail = body["detail"].as_str().expect("detail");
    assert!(detail.contains("theme T"), "detail: {detail}");
    assert!(detail.contains("10 points"), "detail: {detail}");
    assert_eq!(ctx.catalog.exam_count(), 0);
}

#[tokio::test]
async fn student_cannot_create_exam() {
    let ctx = test_support::setup_test_context().await;
    seed_theme_t(&ctx.catalog);
    let token = test_support::bearer_token("acc-s", &["student"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(exam_payload(json!({"5": 1}))),
        ))
        .await
        .expect("create exam");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(ctx.catalog.exam_count(), 0);
}

#[tokio::test]
async fn invalid_schedule_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    seed_theme_t(&ctx.catalog);
    let token = test_support::bearer_token("admin-1", &["admin"], ctx.state.settings());
    let mut payload = exam_payload(json!({"5": 1}));
    payload["end_date"] = json!("2030-02-01T09:00:00Z");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(payload),
        ))
        .await
        .expect("create exam");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn request_over_question_limit_is_rejected() {
    let ctx = test_support::setup_test_context().await;
    seed_theme_t(&ctx.catalog);
    let token = test_support::bearer_token("admin-1", &["admin"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(exam_payload(json!({"1": 51}))),
        ))
        .await
        .expect("create exam");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.catalog.theme_fetches().is_empty());
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/exams", None, None))
        .await
        .expect("list exams");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn student_sees_upcoming_exam_without_questions() {
    let ctx = test_support::setup_test_context().await;
    ctx.catalog.add_student("stu-1", "acc-s", "s1");
    let exam = exam_starting_at(primitive_now_utc() + Duration::days(1));
    let exam_id = exam.id.clone();
    ctx.catalog.add_exam(exam);
    let token = test_support::bearer_token("acc-s", &["student"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("get exam");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert!(body.get("questions").is_none());
    assert!(body.get("creator").is_none());
    assert_eq!(body["has_submitted"], false);
}

#[tokio::test]
async fn teacher_sees_started_exam_questions_without_creator() {
    let ctx = test_support::setup_test_context().await;
    let exam = exam_starting_at(primitive_now_utc() - Duration::hours(1));
    let exam_id = exam.id.clone();
    ctx.catalog.add_exam(exam);
    let token = test_support::bearer_token("teacher-2", &["teacher"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("get exam");

    let body = test_support::read_json(response).await;
    assert_eq!(body["questions"].as_array().expect("questions").len(), 2);
    assert!(body.get("creator").is_none());
}

#[tokio::test]
async fn student_without_record_gets_generic_error() {
    let ctx = test_support::setup_test_context().await;
    let exam = exam_starting_at(primitive_now_utc());
    let exam_id = exam.id.clone();
    ctx.catalog.add_exam(exam);
    let token = test_support::bearer_token("ghost", &["student"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("get exam");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().expect("detail").contains("ghost"));
}

#[tokio::test]
async fn unknown_exam_is_not_found() {
    let ctx = test_support::setup_test_context().await;
    let token = test_support::bearer_token("admin-1", &["admin"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams/does-not-exist",
            Some(&token),
            None,
        ))
        .await
        .expect("get exam");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_roles_yield_empty_views() {
    let ctx = test_support::setup_test_context().await;
    let exam = exam_starting_at(primitive_now_utc());
    let exam_id = exam.id.clone();
    ctx.catalog.add_exam(exam);
    let token = test_support::bearer_token("acc-x", &["proctor"], ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{exam_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("get exam");
    assert_eq!(test_support::read_json(response).await, json!({}));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/exams", Some(&token), None))
        .await
        .expect("list exams");
    assert_eq!(test_support::read_json(response).await, json!([]));
}

#[tokio::test]
async fn lists_follow_audience_rules() {
    let ctx = test_support::setup_test_context().await;
    let now = primitive_now_utc();
    let past = exam_starting_at(now - Duration::days(2));
    let upcoming = exam_starting_at(now + Duration::days(2));
    let upcoming_id = upcoming.id.clone();
    ctx.catalog.add_exam(past);
    ctx.catalog.add_exam(upcoming);

    let admin = test_support::bearer_token("admin-1", &["admin"], ctx.state.settings());
    let student = test_support::bearer_token("acc-s", &["student"], ctx.state.settings());

    let cases = [
        (&admin, "/api/v1/exams", 2),
        (&admin, "/api/v1/exams/upcoming", 1),
        (&student, "/api/v1/exams", 1),
        (&student, "/api/v1/exams/upcoming", 1),
    ];
    for (token, uri, expected) in cases {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, uri, Some(token), None))
            .await
            .expect("list exams");
        let body = test_support::read_json(response).await;
        let items = body.as_array().expect("array");
        assert_eq!(items.len(), expected, "{uri}: {body}");
        assert!(items.iter().all(|item| item.get("creator").is_none()));
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams",
            Some(&student),
            None,
        ))
        .await
        .expect("list exams");
    let body = test_support::read_json(response).await;
    assert_eq!(body[0]["id"], upcoming_id.as_str());
}

#[tokio::test]
async fn past_listing_only_holds_finished_exams() {
    let ctx = test_support::setup_test_context().await;
    let now = primitive_now_utc();
    let finished = exam_starting_at(now - Duration::days(3));
    let finished_id = finished.id.clone();
    let running = exam_starting_at(now - Duration::minutes(30));
    ctx.catalog.add_exam(finished);
    ctx.catalog.add_exam(running);
    ctx.catalog.add_exam(exam_starting_at(now + Duration::days(3)));

    let teacher = test_support::bearer_token("teacher-1", &["teacher"], ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams/past",
            Some(&teacher),
            None,
        ))
        .await
        .expect("list past exams");
    let body = test_support::read_json(response).await;
    let items = body.as_array().expect("array");
    assert_eq!(items.len(), 1, "{body}");
    assert_eq!(items[0]["id"], finished_id.as_str());
    assert!(items[0].get("creator").is_none());

    let student = test_support::bearer_token("acc-s", &["student"], ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams/past",
            Some(&student),
            None,
        ))
        .await
        .expect("list past exams");
    assert_eq!(test_support::read_json(response).await, json!([]));
}
