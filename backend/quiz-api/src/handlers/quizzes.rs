use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::services::{catalog_service::CatalogError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListQuizzesParams {
    pub course_id: String,
}

pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuizzesParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Listing quizzes for course: {}", params.course_id);

    match state.catalog.list_quizzes(&params.course_id).await {
        Ok(quizzes) => Ok((StatusCode::OK, Json(json!({ "quizzes": quizzes })))),
        Err(e) => {
            tracing::error!("Failed to list quizzes: {}", e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Fetching quiz: {}", quiz_id);

    match state.catalog.fetch_quiz(&quiz_id).await {
        Ok(quiz) => Ok((StatusCode::OK, Json(quiz))),
        Err(CatalogError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Quiz not found".to_string()))
        }
        Err(e) => {
            tracing::error!("Failed to fetch quiz {}: {}", quiz_id, e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}
