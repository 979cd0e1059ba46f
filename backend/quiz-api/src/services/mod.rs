use std::sync::Arc;

use crate::config::Config;
use attempt_service::AttemptService;
use catalog_service::QuizCatalog;
use grading_service::GradingBackend;

pub mod attempt_service;
pub mod catalog_service;
pub mod grading_service;

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn QuizCatalog>,
    pub grading: Arc<dyn GradingBackend>,
    pub attempts: Arc<AttemptService>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn QuizCatalog>,
        grading: Arc<dyn GradingBackend>,
    ) -> Self {
        let attempts = Arc::new(AttemptService::new(catalog.clone(), grading.clone()));
        Self {
            config,
            catalog,
            grading,
            attempts,
        }
    }
}
