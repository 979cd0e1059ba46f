use std::time::Duration;

use async_trait::async_trait;

use crate::metrics::track_collaborator_call;
use crate::models::answer::SubmissionPayload;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);
const PING_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum GradingError {
    #[error("grading service rejected the submission: {status}")]
    Rejected { status: u16 },
    #[error("grading service request failed: {0}")]
    Transport(String),
}

/// Delivery seam for finished answer sets. The session never interprets the
/// grading response beyond success/failure.
#[async_trait]
pub trait GradingBackend: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), GradingError>;
    async fn ping(&self) -> Result<(), GradingError>;
}

pub struct HttpGradingBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGradingBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GradingBackend for HttpGradingBackend {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), GradingError> {
        let url = format!("{}/internal/submissions", self.base_url);
        tracing::debug!(
            "Delivering submission: attempt={} quiz={} answers={}",
            payload.attempt_id,
            payload.quiz_id,
            payload.answers.len()
        );

        // No transport retries here: a repeated POST could grade the same
        // attempt twice. A failed delivery goes back through the attempt
        // lifecycle and the learner re-invokes submit.
        let response = track_collaborator_call("grading", "submit", async {
            self.client
                .post(&url)
                .timeout(SUBMIT_TIMEOUT)
                .json(payload)
                .send()
                .await
        })
        .await
        .map_err(|e| GradingError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(GradingError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }

    async fn ping(&self) -> Result<(), GradingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .map_err(|e| GradingError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(GradingError::Transport(format!(
                "grading service returned {}",
                response.status()
            )))
        }
    }
}
