use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn grading_failure_is_recoverable_without_answer_loss() {
    let app = common::create_test_app().await;

    let (_, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/attempts",
        Some(json!({ "quiz_id": "quiz-networks-final", "learner_id": "learner-1" })),
    )
    .await;
    let id = body["attempt_id"].as_str().unwrap().to_string();

    send_json(
        &app.router,
        "POST",
        &format!("/api/v1/attempts/{}/answers", id),
        Some(json!({ "question_id": "q1", "answer": "TCP" })),
    )
    .await;
    send_json(
        &app.router,
        "POST",
        &format!("/api/v1/attempts/{}/submission", id),
        None,
    )
    .await;

    // First delivery fails at the grading collaborator.
    app.grader.fail_next(1);
    let (status, body) = send_json(
        &app.router,
        "POST",
        &format!("/api/v1/attempts/{}/submission/confirm", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("submission failed"));

    // The attempt is back at the last active question with answers intact
    // and the failure surfaced.
    let (_, view) = send_json(&app.router, "GET", &format!("/api/v1/attempts/{}", id), None).await;
    assert_eq!(view["phase"]["state"], "active");
    assert_eq!(view["answers"]["q1"], "TCP");
    assert!(view["last_error"].as_str().is_some());

    // Retrying goes through the normal lifecycle and succeeds.
    send_json(
        &app.router,
        "POST",
        &format!("/api/v1/attempts/{}/submission", id),
        None,
    )
    .await;
    let (status, view) = send_json(
        &app.router,
        "POST",
        &format!("/api/v1/attempts/{}/submission/confirm", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"]["state"], "done");
    assert!(view.get("last_error").is_none());

    assert_eq!(app.grader.delivery_count(), 1);
    let delivery = app.grader.last_delivery();
    assert_eq!(delivery.answers[0].answer, "TCP");
}

#[tokio::test]
async fn zero_time_limit_auto_submits_at_start() {
    let app = common::create_test_app().await;

    let (status, body) = send_json(
        &app.router,
        "POST",
        "/api/v1/attempts",
        Some(json!({ "quiz_id": "quiz-zero-limit", "learner_id": "learner-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phase"]["state"], "done");
    assert_eq!(body["remaining_seconds"], 0);

    // Forced submission carried the blank sentinel for the lone question.
    assert_eq!(app.grader.delivery_count(), 1);
    let delivery = app.grader.last_delivery();
    assert_eq!(delivery.quiz_id, "quiz-zero-limit");
    assert_eq!(delivery.answers.len(), 1);
    assert_eq!(delivery.answers[0].question_id, "z1");
    assert_eq!(delivery.answers[0].answer, "");
}
