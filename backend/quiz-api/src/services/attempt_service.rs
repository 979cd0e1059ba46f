use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::metrics::{ANSWERS_RECORDED_TOTAL, ATTEMPTS_ACTIVE, ATTEMPTS_TOTAL, SUBMISSIONS_TOTAL};
use crate::models::answer::{AnswerEntry, RecordAnswerResponse, SubmissionCheck, SubmissionPayload};
use crate::models::attempt::{AttemptPhase, Direction, QuizAttempt, TickOutcome, TransitionError};
use crate::models::timer::TimerEvent;
use crate::models::{AdvanceResponse, AttemptView};
use crate::services::catalog_service::{CatalogError, QuizCatalog};
use crate::services::grading_service::{GradingBackend, GradingError};

#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("attempt {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("attempt limit reached: quiz allows {max_attempts} attempts")]
    LimitReached { max_attempts: u32 },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("submission failed: {0}")]
    Grading(#[from] GradingError),
}

struct AttemptEntry {
    attempt: Arc<Mutex<QuizAttempt>>,
    events: broadcast::Sender<TimerEvent>,
    clock: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// In-process registry of live attempts plus the per-attempt countdown
/// tasks. All attempt mutation goes through the per-attempt mutex; the
/// one-second clock and request handlers serialize on it, so a tick can
/// never interleave with a half-applied user transition.
pub struct AttemptService {
    catalog: Arc<dyn QuizCatalog>,
    grading: Arc<dyn GradingBackend>,
    attempts: RwLock<HashMap<String, Arc<AttemptEntry>>>,
    /// Attempts started per (learner, quiz), checked against `max_attempts`.
    started: RwLock<HashMap<(String, String), u32>>,
}

impl AttemptService {
    pub fn new(catalog: Arc<dyn QuizCatalog>, grading: Arc<dyn GradingBackend>) -> Self {
        Self {
            catalog,
            grading,
            attempts: RwLock::new(HashMap::new()),
            started: RwLock::new(HashMap::new()),
        }
    }

    pub async fn start_attempt(
        self: &Arc<Self>,
        quiz_id: &str,
        learner_id: &str,
    ) -> Result<AttemptView, AttemptError> {
        let quiz = Arc::new(self.catalog.fetch_quiz(quiz_id).await?);
        self.reserve_attempt_slot(learner_id, quiz_id, quiz.max_attempts)
            .await?;

        let attempt_id = Uuid::new_v4().to_string();
        let attempt = Arc::new(Mutex::new(QuizAttempt::new(
            attempt_id.clone(),
            learner_id.to_string(),
            quiz.clone(),
        )));
        let (events, _) = broadcast::channel(64);
        let entry = Arc::new(AttemptEntry {
            attempt,
            events,
            clock: std::sync::Mutex::new(None),
        });
        self.attempts
            .write()
            .await
            .insert(attempt_id.clone(), entry.clone());

        ATTEMPTS_TOTAL.with_label_values(&["started"]).inc();
        ATTEMPTS_ACTIVE.inc();
        tracing::info!(
            "Attempt started: {} quiz={} learner={}",
            attempt_id,
            quiz.id,
            learner_id
        );

        match quiz.time_limit_seconds() {
            // A zero-length limit expires before the first tick.
            Some(0) => {
                let answers = { entry.attempt.lock().await.force_expire() };
                if let Some(answers) = answers {
                    let _ = entry.events.send(TimerEvent::expired(&attempt_id));
                    ATTEMPTS_TOTAL.with_label_values(&["expired"]).inc();
                    if let Err(error) = self
                        .dispatch_submission(&entry, answers, "expiry")
                        .await
                    {
                        tracing::warn!(
                            "Immediate expiry submission failed for {}: {}",
                            attempt_id,
                            error
                        );
                    }
                }
            }
            Some(_) => {
                let handle = self.spawn_clock(attempt_id.clone());
                *entry.clock.lock().unwrap() = Some(handle);
            }
            None => {}
        }

        Ok(Self::snapshot(&entry).await)
    }

    pub async fn view(&self, attempt_id: &str) -> Result<AttemptView, AttemptError> {
        let entry = self.require_entry(attempt_id).await?;
        Ok(Self::snapshot(&entry).await)
    }

    pub async fn advance(
        &self,
        attempt_id: &str,
        direction: Direction,
    ) -> Result<AdvanceResponse, AttemptError> {
        let entry = self.require_entry(attempt_id).await?;
        let mut attempt = entry.attempt.lock().await;
        let question_index = attempt.advance(direction);
        Ok(AdvanceResponse {
            question_index,
            question: attempt.current_question().cloned(),
        })
    }

    pub async fn record_answer(
        &self,
        attempt_id: &str,
        question_id: &str,
        answer: String,
    ) -> Result<RecordAnswerResponse, AttemptError> {
        let entry = self.require_entry(attempt_id).await?;
        let mut attempt = entry.attempt.lock().await;
        attempt.record_answer(question_id, answer)?;
        ANSWERS_RECORDED_TOTAL.inc();
        Ok(RecordAnswerResponse {
            question_id: question_id.to_string(),
            answered_count: attempt.answered_count(),
            total_questions: attempt.question_count(),
        })
    }

    pub async fn request_submission(
        &self,
        attempt_id: &str,
    ) -> Result<SubmissionCheck, AttemptError> {
        let entry = self.require_entry(attempt_id).await?;
        let mut attempt = entry.attempt.lock().await;
        let (answered_count, total_questions) = attempt.request_submission()?;
        Ok(SubmissionCheck {
            answered_count,
            total_questions,
        })
    }

    pub async fn cancel_submission(
        &self,
        attempt_id: &str,
    ) -> Result<AdvanceResponse, AttemptError> {
        let entry = self.require_entry(attempt_id).await?;
        let mut attempt = entry.attempt.lock().await;
        let question_index = attempt.cancel_submission()?;
        Ok(AdvanceResponse {
            question_index,
            question: attempt.current_question().cloned(),
        })
    }

    /// Confirm and deliver. The `Submitting` transition is taken under the
    /// attempt lock before the grading call is awaited; a second confirm (or
    /// an expiry tick) arriving meanwhile sees `SubmissionInFlight` and never
    /// produces a second outbound call.
    pub async fn confirm_submission(
        &self,
        attempt_id: &str,
    ) -> Result<AttemptView, AttemptError> {
        let entry = self.require_entry(attempt_id).await?;
        let answers = { entry.attempt.lock().await.begin_submission()? };
        self.dispatch_submission(&entry, answers, "manual").await?;
        Ok(Self::snapshot(&entry).await)
    }

    pub async fn abandon(&self, attempt_id: &str) -> Result<(), AttemptError> {
        let entry = self
            .attempts
            .write()
            .await
            .remove(attempt_id)
            .ok_or_else(|| AttemptError::NotFound(attempt_id.to_string()))?;

        self.stop_clock(&entry);
        let was_live = { entry.attempt.lock().await.phase != AttemptPhase::Done };
        if was_live {
            ATTEMPTS_ACTIVE.dec();
            ATTEMPTS_TOTAL.with_label_values(&["abandoned"]).inc();
        }
        tracing::info!("Attempt abandoned: {}", attempt_id);
        Ok(())
    }

    /// Timer event feed for SSE. `None` when the quiz has no time limit:
    /// there is no countdown to stream.
    pub async fn subscribe(
        &self,
        attempt_id: &str,
    ) -> Result<Option<broadcast::Receiver<TimerEvent>>, AttemptError> {
        let entry = self.require_entry(attempt_id).await?;
        let timed = { entry.attempt.lock().await.total_seconds().is_some() };
        Ok(timed.then(|| entry.events.subscribe()))
    }

    async fn reserve_attempt_slot(
        &self,
        learner_id: &str,
        quiz_id: &str,
        max_attempts: u32,
    ) -> Result<(), AttemptError> {
        let mut started = self.started.write().await;
        let count = started
            .entry((learner_id.to_string(), quiz_id.to_string()))
            .or_insert(0);
        if *count >= max_attempts {
            return Err(AttemptError::LimitReached { max_attempts });
        }
        *count += 1;
        Ok(())
    }

    fn spawn_clock(self: &Arc<Self>, attempt_id: String) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick resolves immediately; consume it so the
            // countdown loses its first second a full second after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !service.tick_attempt(&attempt_id).await {
                    break;
                }
            }
        })
    }

    /// One clock beat. Returns false when the clock task should stop.
    async fn tick_attempt(&self, attempt_id: &str) -> bool {
        let Some(entry) = self.entry(attempt_id).await else {
            // Attempt abandoned between beats.
            return false;
        };

        let (outcome, total_seconds) = {
            let mut attempt = entry.attempt.lock().await;
            let total_seconds = attempt.total_seconds().unwrap_or(0);
            (attempt.tick(), total_seconds)
        };

        match outcome {
            TickOutcome::Counting { remaining_seconds } => {
                let _ = entry
                    .events
                    .send(TimerEvent::tick(attempt_id, remaining_seconds, total_seconds));
                true
            }
            TickOutcome::Expired => {
                let _ = entry.events.send(TimerEvent::expired(attempt_id));
                ATTEMPTS_TOTAL.with_label_values(&["expired"]).inc();
                let answers = { entry.attempt.lock().await.submission_payload() };
                if let Err(error) = self.dispatch_submission(&entry, answers, "expiry").await {
                    tracing::warn!(
                        "Auto-submission after expiry failed for {}: {}",
                        attempt_id,
                        error
                    );
                }
                false
            }
            TickOutcome::Idle => true,
        }
    }

    /// Deliver a frozen answer set. The attempt is already `Submitting`;
    /// success finishes it, failure hands it back to the learner untouched.
    async fn dispatch_submission(
        &self,
        entry: &Arc<AttemptEntry>,
        answers: Vec<AnswerEntry>,
        trigger: &str,
    ) -> Result<(), AttemptError> {
        let payload = {
            let attempt = entry.attempt.lock().await;
            SubmissionPayload {
                attempt_id: attempt.id.clone(),
                quiz_id: attempt.quiz.id.clone(),
                learner_id: attempt.learner_id.clone(),
                submitted_at: Utc::now(),
                answers,
            }
        };

        match self.grading.submit(&payload).await {
            Ok(()) => {
                {
                    let mut attempt = entry.attempt.lock().await;
                    if let Err(error) = attempt.complete() {
                        tracing::error!(
                            "Attempt {} could not finish after accepted submission: {}",
                            payload.attempt_id,
                            error
                        );
                    }
                }
                SUBMISSIONS_TOTAL
                    .with_label_values(&[trigger, "accepted"])
                    .inc();
                ATTEMPTS_TOTAL.with_label_values(&["submitted"]).inc();
                // An abandon that raced the in-flight delivery has already
                // taken this attempt out of the live count.
                if self
                    .attempts
                    .read()
                    .await
                    .contains_key(&payload.attempt_id)
                {
                    ATTEMPTS_ACTIVE.dec();
                }
                // Safe from the clock task itself: its loop exits before the
                // next await once the expiry beat completes.
                self.stop_clock(entry);
                tracing::info!(
                    "Attempt submitted: {} ({} answers, {} trigger)",
                    payload.attempt_id,
                    payload.answers.len(),
                    trigger
                );
                Ok(())
            }
            Err(error) => {
                {
                    let mut attempt = entry.attempt.lock().await;
                    attempt.fail_submission(error.to_string());
                }
                SUBMISSIONS_TOTAL
                    .with_label_values(&[trigger, "rejected"])
                    .inc();
                tracing::warn!(
                    "Submission failed for attempt {}: {}",
                    payload.attempt_id,
                    error
                );
                Err(AttemptError::Grading(error))
            }
        }
    }

    fn stop_clock(&self, entry: &AttemptEntry) {
        if let Some(handle) = entry.clock.lock().unwrap().take() {
            handle.abort();
        }
    }

    async fn entry(&self, attempt_id: &str) -> Option<Arc<AttemptEntry>> {
        self.attempts.read().await.get(attempt_id).cloned()
    }

    async fn require_entry(&self, attempt_id: &str) -> Result<Arc<AttemptEntry>, AttemptError> {
        self.entry(attempt_id)
            .await
            .ok_or_else(|| AttemptError::NotFound(attempt_id.to_string()))
    }

    async fn snapshot(entry: &AttemptEntry) -> AttemptView {
        AttemptView::from_attempt(&*entry.attempt.lock().await)
    }
}
