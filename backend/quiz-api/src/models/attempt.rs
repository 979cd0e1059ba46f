use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::answer::AnswerEntry;
use crate::models::quiz::{Question, Quiz};

/// Where an attempt currently is in its lifecycle.
///
/// `Active` carries the position of the single question being presented.
/// `ConfirmingSubmit` is the manual-submission confirmation dialog;
/// `Submitting` means one grading call is in flight; `Done` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptPhase {
    Active { question_index: usize },
    ConfirmingSubmit,
    Submitting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

/// Result of one second elapsing on the attempt clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to do: no countdown, a non-counting phase, or the expiry
    /// trigger has already fired.
    Idle,
    Counting { remaining_seconds: u32 },
    /// The countdown crossed zero and the attempt moved to `Submitting`.
    Expired,
}

/// A lifecycle call that is not legal in the attempt's current phase.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("question {0} does not belong to this quiz")]
    UnknownQuestion(String),
    #[error("attempt is not awaiting submission confirmation")]
    NotConfirming,
    #[error("submission is already in progress")]
    SubmissionInFlight,
    #[error("attempt is already finished")]
    Finished,
}

/// One learner running one quiz: position, answers, countdown and the
/// submission lifecycle. Pure state - all I/O (the clock task, the grading
/// call) lives in the attempt service, which drives this through the
/// transition methods below.
#[derive(Debug)]
pub struct QuizAttempt {
    pub id: String,
    pub learner_id: String,
    pub quiz: Arc<Quiz>,
    pub phase: AttemptPhase,
    pub started_at: DateTime<Utc>,
    /// Present only when the quiz declares a time limit. Never increases.
    pub remaining_seconds: Option<u32>,
    /// Last submission failure, surfaced to the client until the next
    /// submission succeeds.
    pub last_error: Option<String>,
    answers: HashMap<String, String>,
    resume_index: usize,
    expiry_fired: bool,
}

impl QuizAttempt {
    pub fn new(id: String, learner_id: String, quiz: Arc<Quiz>) -> Self {
        let remaining_seconds = quiz.time_limit_seconds();
        Self {
            id,
            learner_id,
            quiz,
            phase: AttemptPhase::Active { question_index: 0 },
            started_at: Utc::now(),
            remaining_seconds,
            last_error: None,
            answers: HashMap::new(),
            resume_index: 0,
            expiry_fired: false,
        }
    }

    pub fn question_count(&self) -> usize {
        self.quiz.question_count()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> &HashMap<String, String> {
        &self.answers
    }

    /// The question currently presented, if the attempt is `Active`.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            AttemptPhase::Active { question_index } => self.quiz.questions.get(question_index),
            _ => None,
        }
    }

    pub fn total_seconds(&self) -> Option<u32> {
        self.quiz.time_limit_seconds()
    }

    /// Zero-length time limits expire before the first tick.
    pub fn expires_immediately(&self) -> bool {
        self.remaining_seconds == Some(0)
    }

    /// Move one question forward or back. Saturates at both ends instead of
    /// erroring; ignored outside `Active`. Returns the resulting position.
    pub fn advance(&mut self, direction: Direction) -> usize {
        if let AttemptPhase::Active { question_index } = self.phase {
            let last = self.question_count().saturating_sub(1);
            let next = match direction {
                Direction::Next => question_index.saturating_add(1).min(last),
                Direction::Previous => question_index.saturating_sub(1),
            };
            self.phase = AttemptPhase::Active {
                question_index: next,
            };
            next
        } else {
            self.resume_index
        }
    }

    /// Store the learner's answer verbatim, overwriting any prior value.
    /// The empty string is a legal recorded answer, distinct from a question
    /// that was never answered. Writes outside `Active` are ignored so a
    /// stale client cannot mutate a frozen answer set.
    pub fn record_answer(&mut self, question_id: &str, value: String) -> Result<(), TransitionError> {
        if self.quiz.question(question_id).is_none() {
            return Err(TransitionError::UnknownQuestion(question_id.to_string()));
        }
        if matches!(self.phase, AttemptPhase::Active { .. }) {
            self.answers.insert(question_id.to_string(), value);
        }
        Ok(())
    }

    /// `Active(i) -> ConfirmingSubmit`, remembering `i` for cancel/failure.
    /// Allowed from any position; partial answer sets never block submission.
    /// Returns `(answered, total)` for the confirmation display.
    pub fn request_submission(&mut self) -> Result<(usize, usize), TransitionError> {
        match self.phase {
            AttemptPhase::Active { question_index } => {
                self.resume_index = question_index;
                self.phase = AttemptPhase::ConfirmingSubmit;
                Ok((self.answered_count(), self.question_count()))
            }
            // Re-requesting while the dialog is already open is harmless.
            AttemptPhase::ConfirmingSubmit => Ok((self.answered_count(), self.question_count())),
            AttemptPhase::Submitting => Err(TransitionError::SubmissionInFlight),
            AttemptPhase::Done => Err(TransitionError::Finished),
        }
    }

    /// `ConfirmingSubmit -> Active(resume)`. Returns the restored position.
    pub fn cancel_submission(&mut self) -> Result<usize, TransitionError> {
        match self.phase {
            AttemptPhase::ConfirmingSubmit => {
                self.phase = AttemptPhase::Active {
                    question_index: self.resume_index,
                };
                Ok(self.resume_index)
            }
            AttemptPhase::Submitting => Err(TransitionError::SubmissionInFlight),
            AttemptPhase::Done => Err(TransitionError::Finished),
            AttemptPhase::Active { .. } => Err(TransitionError::NotConfirming),
        }
    }

    /// `ConfirmingSubmit -> Submitting`. The caller must take this transition
    /// under the attempt lock before awaiting the grading call - that is the
    /// exactly-once guard against double clicks and tick races.
    pub fn begin_submission(&mut self) -> Result<Vec<AnswerEntry>, TransitionError> {
        match self.phase {
            AttemptPhase::ConfirmingSubmit => {
                self.phase = AttemptPhase::Submitting;
                Ok(self.submission_payload())
            }
            AttemptPhase::Submitting => Err(TransitionError::SubmissionInFlight),
            AttemptPhase::Done => Err(TransitionError::Finished),
            AttemptPhase::Active { .. } => Err(TransitionError::NotConfirming),
        }
    }

    /// Forced submission on expiry: bypasses confirmation, fires at most once
    /// per attempt, and is suppressed while a manual submission is in flight.
    /// Returns the payload when the trigger actually fired.
    pub fn force_expire(&mut self) -> Option<Vec<AnswerEntry>> {
        if self.expiry_fired {
            return None;
        }
        match self.phase {
            AttemptPhase::Active { question_index } => {
                self.resume_index = question_index;
            }
            AttemptPhase::ConfirmingSubmit => {}
            AttemptPhase::Submitting | AttemptPhase::Done => return None,
        }
        self.expiry_fired = true;
        self.phase = AttemptPhase::Submitting;
        Some(self.submission_payload())
    }

    /// One second elapsed. Decrements the countdown (saturating at zero)
    /// while the attempt is in a counting phase; crossing zero takes the
    /// forced-submission transition. Everything else is a no-op, so a tick
    /// that loses the race against a manual submission cannot double-submit.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(remaining) = self.remaining_seconds else {
            return TickOutcome::Idle;
        };
        if self.expiry_fired
            || !matches!(
                self.phase,
                AttemptPhase::Active { .. } | AttemptPhase::ConfirmingSubmit
            )
        {
            return TickOutcome::Idle;
        }

        let next = remaining.saturating_sub(1);
        self.remaining_seconds = Some(next);
        if next == 0 {
            match self.force_expire() {
                Some(_) => TickOutcome::Expired,
                None => TickOutcome::Idle,
            }
        } else {
            TickOutcome::Counting {
                remaining_seconds: next,
            }
        }
    }

    /// `Submitting -> Done`. Answers stay frozen in place.
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        match self.phase {
            AttemptPhase::Submitting => {
                self.phase = AttemptPhase::Done;
                self.last_error = None;
                Ok(())
            }
            AttemptPhase::Done => Err(TransitionError::Finished),
            _ => Err(TransitionError::NotConfirming),
        }
    }

    /// `Submitting -> Active(resume)` with the error surfaced. Nothing is
    /// lost: the answer set is untouched and the learner may submit again.
    pub fn fail_submission(&mut self, error: String) {
        if matches!(self.phase, AttemptPhase::Submitting) {
            self.phase = AttemptPhase::Active {
                question_index: self.resume_index,
            };
            self.last_error = Some(error);
        }
    }

    /// The outbound answer set: every question in display order, with the
    /// empty string standing in for questions that were never answered.
    pub fn submission_payload(&self) -> Vec<AnswerEntry> {
        self.quiz
            .questions
            .iter()
            .map(|question| AnswerEntry {
                question_id: question.id.clone(),
                answer: self.answers.get(&question.id).cloned().unwrap_or_default(),
            })
            .collect()
    }
}
