use serde::{Deserialize, Serialize};

/// A quiz definition as served by the content collaborator.
///
/// Immutable for the duration of one attempt: the attempt keeps the
/// definition it was started with even if the catalog publishes a newer
/// revision mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    pub max_attempts: u32,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub total_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub points: u32,
    pub order: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    TrueFalse,
    ShortText,
    LongText,
}

/// Compact listing entry for course quiz lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    pub max_attempts: u32,
    pub total_points: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum QuizDefinitionError {
    #[error("quiz {0} has no questions")]
    Empty(String),
    #[error("quiz {quiz_id} has duplicate question order {order}")]
    DuplicateOrder { quiz_id: String, order: u32 },
}

impl Quiz {
    /// Normalize a raw definition: sort questions into display order,
    /// enforce the unique-order invariant and recompute the point total.
    pub fn normalized(mut self) -> Result<Self, QuizDefinitionError> {
        if self.questions.is_empty() {
            return Err(QuizDefinitionError::Empty(self.id));
        }

        self.questions.sort_by_key(|q| q.order);
        for pair in self.questions.windows(2) {
            if pair[0].order == pair[1].order {
                return Err(QuizDefinitionError::DuplicateOrder {
                    quiz_id: self.id,
                    order: pair[0].order,
                });
            }
        }

        self.total_points = self.questions.iter().map(|q| q.points).sum();
        Ok(self)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Declared ceiling on total attempt time, in whole seconds.
    /// `None` means the quiz has no countdown at all.
    pub fn time_limit_seconds(&self) -> Option<u32> {
        self.time_limit_minutes.map(|minutes| minutes * 60)
    }

    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            question_count: self.questions.len(),
            time_limit_minutes: self.time_limit_minutes,
            max_attempts: self.max_attempts,
            total_points: self.total_points,
        }
    }
}
