// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default question weight used by the quiz service when none is stored.
fn default_points() -> u32 {
    10
}

/// Immutable quiz content, as served by the quiz service.
///
/// Loaded once per session and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizDefinition {
    /// Opaque identifier. The service calls it `_id` on reads and `quizId` on starts.
    #[serde(alias = "_id", alias = "quizId")]
    #[validate(length(min = 1, message = "Quiz id cannot be empty."))]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Time limit in minutes.
    #[serde(default)]
    pub time_limit: Option<u32>,

    /// Explicit time limit in seconds; takes precedence over `time_limit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<u32>,

    /// Order is significant and fixed for the session.
    #[validate(length(min = 1, message = "A quiz needs at least one question."), nested)]
    pub questions: Vec<Question>,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The prompt. Stored as `question` by the quiz service.
    #[serde(alias = "question")]
    #[validate(length(min = 1, message = "Question text cannot be empty."))]
    pub text: String,

    #[validate(length(min = 1, message = "A question needs at least one option."))]
    pub options: Vec<AnswerOption>,

    /// Shown only in review.
    #[serde(default)]
    pub explanation: Option<String>,

    #[serde(default)]
    #[validate(url(message = "Media URL must be a valid URL."))]
    pub media_url: Option<String>,

    /// Weight consumed by the grader, not by the engine.
    #[serde(default = "default_points")]
    #[validate(range(min = 1, message = "Points must be positive."))]
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl QuizDefinition {
    /// Countdown seed in seconds, or `None` if the definition carries no usable limit.
    pub fn time_limit_in_seconds(&self) -> Option<u32> {
        match (self.time_limit_seconds, self.time_limit) {
            (Some(secs), _) if secs > 0 => Some(secs),
            (_, Some(mins)) if mins > 0 => mins.checked_mul(60),
            _ => None,
        }
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Validates the definition at the service boundary.
    pub fn check(&self) -> Result<(), crate::error::AppError> {
        self.validate()?;
        if self.time_limit_in_seconds().is_none() {
            return Err(crate::error::AppError::BadRequest(
                "Quiz has no positive time limit".to_string(),
            ));
        }
        Ok(())
    }
}

impl Question {
    /// The option flagged correct. The first one wins if the data carries several.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|opt| opt.is_correct)
    }

    pub fn has_option(&self, text: &str) -> bool {
        self.options.iter().any(|opt| opt.text == text)
    }

    /// Local correctness, used for immediate feedback only.
    pub fn is_correct(&self, text: &str) -> bool {
        self.options
            .iter()
            .find(|opt| opt.text == text)
            .is_some_and(|opt| opt.is_correct)
    }
}

/// DTO for previewing a quiz before starting (excludes correctness flags and explanations).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub time_limit_seconds: Option<u32>,
    pub questions: Vec<PublicQuestion>,
}

/// DTO for sending a question to the surface (excludes the answer key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub media_url: Option<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            text: q.text.clone(),
            options: q.options.iter().map(|opt| opt.text.clone()).collect(),
            media_url: q.media_url.clone(),
        }
    }
}

impl From<&QuizDefinition> for PublicQuiz {
    fn from(quiz: &QuizDefinition) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            time_limit_seconds: quiz.time_limit_in_seconds(),
            questions: quiz.questions.iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// Learning context the quiz service attaches to a started attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningContext {
    #[serde(default)]
    pub streak: u32,
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    #[serde(default)]
    pub xp_today: u32,
}

fn default_daily_goal() -> u32 {
    100
}

impl Default for LearningContext {
    fn default() -> Self {
        Self {
            streak: 0,
            daily_goal: default_daily_goal(),
            xp_today: 0,
        }
    }
}

/// Response of a successful start: the authoritative definition for this attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptTicket {
    #[serde(flatten)]
    pub quiz: QuizDefinition,
    #[serde(default)]
    pub attempt_number: Option<u32>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub learning: LearningContext,
}
