use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

mod common;

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn list_quizzes_returns_course_summaries() {
    let app = common::create_test_app().await;

    let (status, body) = get(
        &app.router,
        &format!("/api/v1/quizzes?course_id={}", common::COURSE_ID),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let quizzes = body["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 3);

    let final_quiz = quizzes
        .iter()
        .find(|quiz| quiz["id"] == "quiz-networks-final")
        .unwrap();
    assert_eq!(final_quiz["question_count"], 3);
    assert_eq!(final_quiz["max_attempts"], 3);
    assert_eq!(final_quiz["total_points"], 30);
}

#[tokio::test]
async fn list_quizzes_for_unknown_course_is_empty() {
    let app = common::create_test_app().await;

    let (status, body) = get(&app.router, "/api/v1/quizzes?course_id=course-ghost").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quizzes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn list_quizzes_requires_course_id() {
    let app = common::create_test_app().await;

    let (status, _) = get(&app.router, "/api/v1/quizzes").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_quiz_returns_questions_in_display_order() {
    let app = common::create_test_app().await;

    let (status, body) = get(&app.router, "/api/v1/quizzes/quiz-networks-final").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Networking final");
    let questions = body["questions"].as_array().unwrap();
    let orders: Vec<u64> = questions
        .iter()
        .map(|question| question["order"].as_u64().unwrap())
        .collect();
    let mut sorted = orders.clone();
    sorted.sort_unstable();
    assert_eq!(orders, sorted);

    // Option lists only accompany single-choice questions.
    assert!(questions[0]["options"].is_array());
    assert!(questions[1].get("options").is_none());
}

#[tokio::test]
async fn get_unknown_quiz_returns_404() {
    let app = common::create_test_app().await;

    let (status, _) = get(&app.router, "/api/v1/quizzes/quiz-missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
