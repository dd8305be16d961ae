// src/models/session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    quiz::{LearningContext, PublicQuestion},
    result::{LearningStats, ResultSummary},
};

/// Lifecycle of one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

/// One ledger entry: what was picked for a question, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    #[serde(rename = "selectedAnswer")]
    pub selected_option_text: String,
    /// Milliseconds from session start to the selection (cumulative, not per question).
    #[serde(rename = "timeSpent")]
    pub time_spent_ms: u64,
}

/// One submitted slot. Unanswered questions are sent as
/// `{ "selectedAnswer": null, "timeSpent": 0 }`; the grader reads every slot
/// as an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub selected_answer: Option<String>,
    pub time_spent: u64,
}

impl SubmittedAnswer {
    pub fn is_answered(&self) -> bool {
        self.selected_answer.is_some()
    }
}

impl From<Option<AnswerRecord>> for SubmittedAnswer {
    fn from(slot: Option<AnswerRecord>) -> Self {
        match slot {
            Some(record) => Self {
                selected_answer: Some(record.selected_option_text),
                time_spent: record.time_spent_ms,
            },
            None => Self::default(),
        }
    }
}

/// Payload sent to the grading service when an attempt ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub quiz_id: String,
    /// Index-aligned with the quiz questions, one slot per question.
    pub answers: Vec<SubmittedAnswer>,
    /// Total elapsed milliseconds since the session started.
    #[serde(rename = "timeSpent")]
    pub elapsed_ms: u64,
}

/// Why an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

/// Grading progress of a completed attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum GradingState {
    #[default]
    NotSubmitted,
    Pending,
    Graded { result: ResultSummary },
    /// The attempt is over but could not be graded.
    Failed { message: String },
}

/// Immediate right/wrong feedback for the question currently in its feedback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub index: usize,
    pub selected: String,
    pub correct: bool,
    pub correct_option: Option<String>,
    pub combo_count: u32,
    pub max_combo: u32,
    /// Milliseconds until the window closes.
    pub window_ms: u64,
}

/// Outcome of a `selectAnswer` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SelectOutcome {
    Recorded(AnswerFeedback),
    /// Re-selection while feedback for the same question is displayed, or the
    /// session is not accepting answers. Nothing changed.
    Ignored,
}

/// Attempt metadata the quiz service attached at start, carried for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptInfo {
    pub attempt_number: Option<u32>,
    pub max_attempts: Option<u32>,
    pub learning: LearningContext,
}

/// Read-only view of a session for the rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub quiz_id: String,
    pub title: String,
    pub status: SessionStatus,
    pub current_index: usize,
    pub total_questions: usize,
    pub current_question: Option<PublicQuestion>,
    pub time_remaining_seconds: u32,
    /// `m:ss` rendering of `time_remaining_seconds`.
    pub time_display: String,
    pub progress_percent: f64,
    pub combo_count: u32,
    pub max_combo: u32,
    pub ledger: Vec<Option<AnswerRecord>>,
    pub has_progress: bool,
    pub feedback: Option<AnswerFeedback>,
    pub grading: GradingState,
    pub attempt: AttemptInfo,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One line of the post-attempt review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    pub index: usize,
    pub question: String,
    pub media_url: Option<String>,
    pub user_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub correct: bool,
    pub explanation: Option<String>,
}

/// Everything the results screen shows once an attempt is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReview {
    pub session_id: Uuid,
    pub quiz_id: String,
    pub grading: GradingState,
    pub max_combo: u32,
    pub items: Vec<ReviewItem>,
    pub learning_stats: Option<LearningStats>,
}

/// DTO for starting a session.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    #[validate(length(min = 1, max = 100, message = "Quiz id must be between 1 and 100 characters."))]
    pub quiz_id: String,
    /// Abandon an existing session for the same quiz instead of failing.
    #[serde(default)]
    pub replace: bool,
}

/// DTO for answering a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectAnswerRequest {
    pub index: usize,
    #[validate(length(min = 1, message = "Answer text cannot be empty."))]
    pub text: String,
}
