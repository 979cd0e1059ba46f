use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use openclass_quiz_api::config::Config;
use openclass_quiz_api::create_router;
use openclass_quiz_api::models::answer::SubmissionPayload;
use openclass_quiz_api::models::quiz::{Question, QuestionKind, Quiz, QuizSummary};
use openclass_quiz_api::services::catalog_service::{CatalogError, QuizCatalog};
use openclass_quiz_api::services::grading_service::{GradingBackend, GradingError};
use openclass_quiz_api::services::AppState;

pub const COURSE_ID: &str = "course-networks";

/// In-memory stand-in for the content collaborator.
pub struct FixtureCatalog {
    quizzes: Vec<Quiz>,
}

#[async_trait]
impl QuizCatalog for FixtureCatalog {
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, CatalogError> {
        self.quizzes
            .iter()
            .find(|quiz| quiz.id == quiz_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(quiz_id.to_string()))
    }

    async fn list_quizzes(&self, course_id: &str) -> Result<Vec<QuizSummary>, CatalogError> {
        if course_id == COURSE_ID {
            Ok(self.quizzes.iter().map(Quiz::summary).collect())
        } else {
            Ok(Vec::new())
        }
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// In-memory stand-in for the grading collaborator: records every delivery
/// and can be told to fail the next N calls.
pub struct RecordingGrader {
    pub deliveries: std::sync::Mutex<Vec<SubmissionPayload>>,
    pub fail_remaining: AtomicUsize,
}

impl RecordingGrader {
    pub fn new() -> Self {
        Self {
            deliveries: std::sync::Mutex::new(Vec::new()),
            fail_remaining: AtomicUsize::new(0),
        }
    }

    pub fn fail_next(&self, count: usize) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    pub fn last_delivery(&self) -> SubmissionPayload {
        self.deliveries
            .lock()
            .unwrap()
            .last()
            .expect("no submissions were delivered")
            .clone()
    }
}

#[async_trait]
impl GradingBackend for RecordingGrader {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), GradingError> {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(GradingError::Transport("connection refused".to_string()));
        }
        self.deliveries.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), GradingError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub grader: Arc<RecordingGrader>,
}

pub async fn create_test_app() -> TestApp {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        content_api_url: "http://content.test".to_string(),
        grading_api_url: "http://grading.test".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    };

    let catalog = Arc::new(FixtureCatalog {
        quizzes: fixture_quizzes(),
    });
    let grader = Arc::new(RecordingGrader::new());

    let app_state = Arc::new(AppState::new(config, catalog, grader.clone()));

    TestApp {
        router: create_router(app_state),
        grader,
    }
}

fn question(id: &str, prompt: &str, kind: QuestionKind, order: u32) -> Question {
    Question {
        id: id.to_string(),
        prompt: prompt.to_string(),
        kind,
        options: match kind {
            QuestionKind::SingleChoice => Some(vec![
                "TCP".to_string(),
                "UDP".to_string(),
                "ICMP".to_string(),
            ]),
            _ => None,
        },
        points: 10,
        order,
    }
}

fn fixture_quizzes() -> Vec<Quiz> {
    vec![
        Quiz {
            id: "quiz-networks-final".to_string(),
            title: "Networking final".to_string(),
            time_limit_minutes: None,
            max_attempts: 3,
            questions: vec![
                question(
                    "q1",
                    "Which protocol guarantees delivery?",
                    QuestionKind::SingleChoice,
                    1,
                ),
                question("q2", "Explain three-way handshake.", QuestionKind::LongText, 2),
                question("q3", "UDP is connectionless.", QuestionKind::TrueFalse, 3),
            ],
            total_points: 0,
        }
        .normalized()
        .unwrap(),
        Quiz {
            id: "quiz-single-shot".to_string(),
            title: "One attempt only".to_string(),
            time_limit_minutes: None,
            max_attempts: 1,
            questions: vec![question(
                "s1",
                "Name one routing protocol.",
                QuestionKind::ShortText,
                1,
            )],
            total_points: 0,
        }
        .normalized()
        .unwrap(),
        Quiz {
            id: "quiz-zero-limit".to_string(),
            title: "Expired on arrival".to_string(),
            time_limit_minutes: Some(0),
            max_attempts: 3,
            questions: vec![question(
                "z1",
                "This can never be answered in time.",
                QuestionKind::ShortText,
                1,
            )],
            total_points: 0,
        }
        .normalized()
        .unwrap(),
    ]
}
