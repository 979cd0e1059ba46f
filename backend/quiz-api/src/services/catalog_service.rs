use std::time::Duration;

use async_trait::async_trait;

use crate::metrics::track_collaborator_call;
use crate::models::quiz::{Quiz, QuizDefinitionError, QuizSummary};
use crate::utils::retry::{with_retries, Backoff};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const PING_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("quiz {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Definition(#[from] QuizDefinitionError),
    #[error("content service returned malformed data: {0}")]
    Malformed(String),
    #[error("content service request failed: {0}")]
    Transport(String),
}

/// Read access to quiz definitions owned by the content collaborator.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, CatalogError>;
    async fn list_quizzes(&self, course_id: &str) -> Result<Vec<QuizSummary>, CatalogError>;
    async fn ping(&self) -> Result<(), CatalogError>;
}

pub struct HttpQuizCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQuizCatalog {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Catalog reads are idempotent GETs, so transient transport failures
    /// are retried with backoff before surfacing.
    async fn get_with_retries(&self, url: &str) -> Result<reqwest::Response, CatalogError> {
        with_retries(Backoff::persistent(), || async {
            self.client.get(url).timeout(REQUEST_TIMEOUT).send().await
        })
        .await
        .map_err(|e| CatalogError::Transport(e.to_string()))
    }
}

#[async_trait]
impl QuizCatalog for HttpQuizCatalog {
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, CatalogError> {
        let url = format!("{}/internal/quizzes/{}", self.base_url, quiz_id);
        tracing::debug!("Fetching quiz definition: {}", url);

        let response =
            track_collaborator_call("content", "fetch_quiz", self.get_with_retries(&url)).await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(quiz_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(CatalogError::Transport(format!(
                "content service returned {}",
                response.status()
            )));
        }

        let quiz: Quiz = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;

        Ok(quiz.normalized()?)
    }

    async fn list_quizzes(&self, course_id: &str) -> Result<Vec<QuizSummary>, CatalogError> {
        let url = format!("{}/internal/courses/{}/quizzes", self.base_url, course_id);
        tracing::debug!("Listing quizzes: {}", url);

        let response =
            track_collaborator_call("content", "list_quizzes", self.get_with_retries(&url)).await?;

        if !response.status().is_success() {
            return Err(CatalogError::Transport(format!(
                "content service returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CatalogError::Transport(format!(
                "content service returned {}",
                response.status()
            )))
        }
    }
}
