use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    models::{
        answer::RecordAnswerRequest, attempt::TransitionError, AdvanceRequest, StartAttemptRequest,
    },
    services::{
        attempt_service::AttemptError, catalog_service::CatalogError, AppState,
    },
};

pub async fn start_attempt(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<StartAttemptRequest>,
) -> Result<impl IntoResponse, AttemptApiError> {
    req.validate()
        .map_err(|e| AttemptApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        "Starting attempt: quiz={} learner={}",
        req.quiz_id,
        req.learner_id
    );

    let view = state
        .attempts
        .start_attempt(&req.quiz_id, &req.learner_id)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_attempt(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AttemptApiError> {
    let view = state.attempts.view(&attempt_id).await?;
    Ok(Json(view))
}

pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
    AppJson(req): AppJson<AdvanceRequest>,
) -> Result<impl IntoResponse, AttemptApiError> {
    let response = state.attempts.advance(&attempt_id, req.direction).await?;
    Ok(Json(response))
}

pub async fn record_answer(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
    AppJson(req): AppJson<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AttemptApiError> {
    req.validate()
        .map_err(|e| AttemptApiError::BadRequest(e.to_string()))?;

    let response = state
        .attempts
        .record_answer(&attempt_id, &req.question_id, req.answer)
        .await?;
    Ok(Json(response))
}

pub async fn request_submission(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AttemptApiError> {
    let check = state.attempts.request_submission(&attempt_id).await?;
    Ok(Json(check))
}

pub async fn confirm_submission(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AttemptApiError> {
    tracing::info!("Confirming submission: attempt={}", attempt_id);
    let view = state.attempts.confirm_submission(&attempt_id).await?;
    Ok(Json(view))
}

pub async fn cancel_submission(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AttemptApiError> {
    let response = state.attempts.cancel_submission(&attempt_id).await?;
    Ok(Json(response))
}

pub async fn abandon_attempt(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AttemptApiError> {
    state.attempts.abandon(&attempt_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug)]
pub enum AttemptApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
}

impl From<AttemptError> for AttemptApiError {
    fn from(error: AttemptError) -> Self {
        match error {
            AttemptError::NotFound(_) => AttemptApiError::NotFound(error.to_string()),
            AttemptError::Catalog(CatalogError::NotFound(_)) => {
                AttemptApiError::NotFound(error.to_string())
            }
            AttemptError::Catalog(_) => AttemptApiError::BadGateway(error.to_string()),
            AttemptError::LimitReached { .. } => AttemptApiError::Conflict(error.to_string()),
            AttemptError::Transition(TransitionError::UnknownQuestion(_)) => {
                AttemptApiError::BadRequest(error.to_string())
            }
            AttemptError::Transition(_) => AttemptApiError::Conflict(error.to_string()),
            AttemptError::Grading(_) => AttemptApiError::BadGateway(error.to_string()),
        }
    }
}

impl IntoResponse for AttemptApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AttemptApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AttemptApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AttemptApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AttemptApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
