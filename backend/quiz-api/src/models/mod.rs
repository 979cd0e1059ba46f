use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod answer;
pub mod attempt;
pub mod quiz;
pub mod timer;

use attempt::{AttemptPhase, Direction, QuizAttempt};
use quiz::Question;

#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[validate(length(min = 1, message = "quiz_id must not be empty"))]
    pub quiz_id: String,
    #[validate(length(min = 1, message = "learner_id must not be empty"))]
    pub learner_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub question_index: usize,
    /// The question now presented; absent when the attempt is no longer
    /// `Active` (navigation is ignored there).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
}

/// Snapshot of a running attempt, shaped for the quiz-taking UI: the current
/// phase and question, recorded answers for rehydration, and the countdown.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub attempt_id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub learner_id: String,
    pub phase: AttemptPhase,
    pub question_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<Question>,
    pub answered_count: usize,
    pub answers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl AttemptView {
    pub fn from_attempt(attempt: &QuizAttempt) -> Self {
        Self {
            attempt_id: attempt.id.clone(),
            quiz_id: attempt.quiz.id.clone(),
            quiz_title: attempt.quiz.title.clone(),
            learner_id: attempt.learner_id.clone(),
            phase: attempt.phase.clone(),
            question_count: attempt.question_count(),
            current_question: attempt.current_question().cloned(),
            answered_count: attempt.answered_count(),
            answers: attempt.answers().clone(),
            time_limit_minutes: attempt.quiz.time_limit_minutes,
            remaining_seconds: attempt.remaining_seconds,
            last_error: attempt.last_error.clone(),
            started_at: attempt.started_at,
        }
    }
}
