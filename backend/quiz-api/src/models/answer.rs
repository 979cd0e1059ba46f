use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RecordAnswerRequest {
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub question_id: String,
    /// Stored verbatim; the empty string is a legal "blank" answer.
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct RecordAnswerResponse {
    pub question_id: String,
    pub answered_count: usize,
    pub total_questions: usize,
}

/// Progress counters shown on the submission confirmation dialog.
/// Informational only - unanswered questions never block submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionCheck {
    pub answered_count: usize,
    pub total_questions: usize,
}

/// One `{question_id, answer}` pair of the outbound answer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: String,
    pub answer: String,
}

/// The finished answer set handed to the grading collaborator. Entries are
/// in question display order and cover every question of the quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub attempt_id: String,
    pub quiz_id: String,
    pub learner_id: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<AnswerEntry>,
}
