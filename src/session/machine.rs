// src/session/machine.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    config::SessionTiming,
    error::AppError,
    models::{
        quiz::{AttemptTicket, PublicQuestion, QuizDefinition},
        result::ResultSummary,
        session::{
            AnswerFeedback, AttemptInfo, GradingState, ReviewItem, SelectOutcome, SessionReview,
            SessionSnapshot, SessionStatus, Submission, SubmitTrigger, SubmittedAnswer,
        },
    },
    session::{
        clock::{ClockEvent, SessionClock},
        combo::ComboTracker,
        ledger::AnswerLedger,
    },
    utils::{
        format::{format_clock, progress_percent},
        html::clean_html,
    },
};

/// Feedback currently on display, and when it stops blocking input.
#[derive(Debug, Clone)]
struct FeedbackWindow {
    feedback: AnswerFeedback,
    closes_at: Instant,
}

/// State of one attempt and every transition it allows.
///
/// Purely synchronous: callers pass the current instant in, and time-driven
/// events (clock ticks, feedback expiry) are delivered by the session runner.
/// Transitions that make no sense in the current state are no-ops, not errors.
#[derive(Debug)]
pub struct SessionMachine {
    id: Uuid,
    quiz_id: String,
    status: SessionStatus,
    quiz: Option<Arc<QuizDefinition>>,
    attempt: AttemptInfo,
    current_index: usize,
    clock: SessionClock,
    ledger: AnswerLedger,
    combo: ComboTracker,
    feedback: Option<FeedbackWindow>,
    timing: SessionTiming,
    started_at: Option<Instant>,
    started_wall: Option<DateTime<Utc>>,
    completed_wall: Option<DateTime<Utc>>,
    grading: GradingState,
}

impl SessionMachine {
    pub fn new(id: Uuid, quiz_id: impl Into<String>, timing: SessionTiming) -> Self {
        Self {
            id,
            quiz_id: quiz_id.into(),
            status: SessionStatus::NotStarted,
            quiz: None,
            attempt: AttemptInfo::default(),
            current_index: 0,
            clock: SessionClock::new(0, timing.tick_interval),
            ledger: AnswerLedger::new(0),
            combo: ComboTracker::new(),
            feedback: None,
            timing,
            started_at: None,
            started_wall: None,
            completed_wall: None,
            grading: GradingState::NotSubmitted,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn time_remaining_seconds(&self) -> u32 {
        self.clock.remaining()
    }

    pub fn combo_count(&self) -> u32 {
        self.combo.count()
    }

    pub fn max_combo(&self) -> u32 {
        self.combo.max()
    }

    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    pub fn grading(&self) -> &GradingState {
        &self.grading
    }

    pub fn clock_running(&self) -> bool {
        self.clock.is_running()
    }

    fn question_count(&self) -> usize {
        self.quiz.as_ref().map_or(0, |q| q.question_count())
    }

    fn last_index(&self) -> usize {
        self.question_count().saturating_sub(1)
    }

    fn elapsed_ms(&self, now: Instant) -> u64 {
        self.started_at
            .map_or(0, |start| now.saturating_duration_since(start).as_millis() as u64)
    }

    /// NotStarted -> InProgress, seeded from the attempt the quiz service opened.
    pub fn start(&mut self, ticket: AttemptTicket, now: Instant) -> Result<(), AppError> {
        if self.status != SessionStatus::NotStarted {
            return Err(AppError::Conflict("Session has already started".to_string()));
        }

        ticket.quiz.check()?;
        let seconds = ticket
            .quiz
            .time_limit_in_seconds()
            .ok_or_else(|| AppError::BadRequest("Quiz has no positive time limit".to_string()))?;

        self.ledger = AnswerLedger::new(ticket.quiz.question_count());
        self.clock = SessionClock::new(seconds, self.timing.tick_interval);
        self.quiz = Some(Arc::new(ticket.quiz));
        self.attempt = AttemptInfo {
            attempt_number: ticket.attempt_number,
            max_attempts: ticket.max_attempts,
            learning: ticket.learning,
        };
        self.current_index = 0;
        self.started_at = Some(now);
        self.started_wall = Some(Utc::now());
        self.status = SessionStatus::InProgress;
        self.clock.start();
        Ok(())
    }

    /// InProgress <-> Paused. Only the countdown is suspended; an open feedback
    /// window keeps running and still auto-advances.
    pub fn toggle_pause(&mut self) -> SessionStatus {
        match self.status {
            SessionStatus::InProgress => {
                self.clock.stop();
                self.status = SessionStatus::Paused;
            }
            SessionStatus::Paused => {
                self.status = SessionStatus::InProgress;
                self.clock.start();
            }
            SessionStatus::NotStarted | SessionStatus::Completed => {}
        }
        self.status
    }

    /// Records an answer for `index` and opens its feedback window.
    ///
    /// Re-selecting the same question while its feedback is displayed is
    /// ignored. Unknown indices or option texts are malformed requests.
    pub fn select_answer(
        &mut self,
        index: usize,
        text: &str,
        now: Instant,
    ) -> Result<SelectOutcome, AppError> {
        if self.status != SessionStatus::InProgress {
            return Ok(SelectOutcome::Ignored);
        }
        let Some(quiz) = self.quiz.clone() else {
            return Ok(SelectOutcome::Ignored);
        };
        let question = quiz
            .questions
            .get(index)
            .ok_or_else(|| AppError::BadRequest(format!("No question at index {}", index)))?;
        if !question.has_option(text) {
            return Err(AppError::BadRequest(format!(
                "'{}' is not an option of question {}",
                text, index
            )));
        }
        if self
            .feedback
            .as_ref()
            .is_some_and(|w| w.feedback.index == index && w.closes_at > now)
        {
            return Ok(SelectOutcome::Ignored);
        }

        let elapsed = self.elapsed_ms(now);
        self.ledger.record(index, text, elapsed);

        let correct = question.is_correct(text);
        self.combo.observe(correct);

        let feedback = AnswerFeedback {
            index,
            selected: text.to_string(),
            correct,
            correct_option: question.correct_option().map(|opt| opt.text.clone()),
            combo_count: self.combo.count(),
            max_combo: self.combo.max(),
            window_ms: self.timing.feedback_window.as_millis() as u64,
        };
        self.feedback = Some(FeedbackWindow {
            feedback: feedback.clone(),
            closes_at: now + self.timing.feedback_window,
        });

        Ok(SelectOutcome::Recorded(feedback))
    }

    pub fn feedback_deadline(&self) -> Option<Instant> {
        self.feedback.as_ref().map(|w| w.closes_at)
    }

    /// Closes the feedback window once its deadline has passed and advances
    /// past the answered question unless it was the last one.
    pub fn close_feedback(&mut self, now: Instant) -> bool {
        let Some(window) = self.feedback.as_ref() else {
            return false;
        };
        if window.closes_at > now {
            return false;
        }
        let index = window.feedback.index;
        self.feedback = None;

        let live = matches!(self.status, SessionStatus::InProgress | SessionStatus::Paused);
        if live && index < self.last_index() {
            self.current_index = index + 1;
        }
        true
    }

    /// Moves forward one question. No-op while the current one is unanswered or last.
    pub fn next(&mut self) -> bool {
        if self.status != SessionStatus::InProgress
            || !self.ledger.is_answered(self.current_index)
            || self.current_index >= self.last_index()
        {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Moves back one question, bounded at the first.
    pub fn previous(&mut self) -> bool {
        if self.status != SessionStatus::InProgress || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Waits for the clock's next tick.
    pub async fn next_tick(&mut self) -> ClockEvent {
        self.clock.tick().await
    }

    /// Applies a clock event; returns the submit trigger when time just ran out.
    pub fn on_clock(&mut self, event: ClockEvent) -> Option<SubmitTrigger> {
        match event {
            ClockEvent::Expired if self.status == SessionStatus::InProgress => {
                Some(SubmitTrigger::Timeout)
            }
            _ => None,
        }
    }

    /// InProgress -> Completed.
    ///
    /// Returns the submission to grade, exactly once per session: the status is
    /// flipped before anything is sent, so a second trigger finds `Completed`
    /// and gets `None`. A manual submit is only accepted on the last question.
    pub fn begin_submit(&mut self, trigger: SubmitTrigger, now: Instant) -> Option<Submission> {
        if self.status != SessionStatus::InProgress {
            return None;
        }
        if trigger == SubmitTrigger::Manual && self.current_index != self.last_index() {
            return None;
        }

        self.status = SessionStatus::Completed;
        self.clock.dispose();
        self.feedback = None;
        self.completed_wall = Some(Utc::now());
        self.grading = GradingState::Pending;

        Some(Submission {
            quiz_id: self.quiz_id.clone(),
            answers: self.ledger.padded().into_iter().map(SubmittedAnswer::from).collect(),
            elapsed_ms: self.elapsed_ms(now),
        })
    }

    /// Stores what the grading service answered. Ignored unless a submission is pending.
    pub fn finish_submit(&mut self, outcome: Result<ResultSummary, AppError>) {
        if self.grading != GradingState::Pending {
            return;
        }
        self.grading = match outcome {
            Ok(result) => GradingState::Graded { result },
            Err(err) => GradingState::Failed {
                message: err.message().to_string(),
            },
        };
    }

    /// Tears the session down: the clock is released and any feedback dropped.
    pub fn abandon(&mut self) {
        self.clock.dispose();
        self.feedback = None;
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        let total = self.question_count();
        let remaining = self.clock.remaining();
        let feedback = self.feedback.as_ref().map(|w| AnswerFeedback {
            window_ms: w.closes_at.saturating_duration_since(now).as_millis() as u64,
            ..w.feedback.clone()
        });
        let current_question = match self.status {
            SessionStatus::InProgress | SessionStatus::Paused => self
                .quiz
                .as_ref()
                .and_then(|q| q.questions.get(self.current_index))
                .map(PublicQuestion::from),
            SessionStatus::NotStarted | SessionStatus::Completed => None,
        };

        SessionSnapshot {
            session_id: self.id,
            quiz_id: self.quiz_id.clone(),
            title: self.quiz.as_ref().map(|q| q.title.clone()).unwrap_or_default(),
            status: self.status,
            current_index: self.current_index,
            total_questions: total,
            current_question,
            time_remaining_seconds: remaining,
            time_display: format_clock(remaining),
            progress_percent: progress_percent(self.current_index, total),
            combo_count: self.combo.count(),
            max_combo: self.combo.max(),
            ledger: self.ledger.all().to_vec(),
            has_progress: self.ledger.answered_count() > 0,
            feedback,
            grading: self.grading.clone(),
            attempt: self.attempt.clone(),
            started_at: self.started_wall,
            completed_at: self.completed_wall,
        }
    }

    /// Per-question review for the results screen. Only available once completed.
    pub fn review(&self) -> Result<SessionReview, AppError> {
        if self.status != SessionStatus::Completed {
            return Err(AppError::Conflict("Session is not completed yet".to_string()));
        }
        let quiz = self
            .quiz
            .as_ref()
            .ok_or_else(|| AppError::InternalServerError("Completed session without quiz".to_string()))?;

        let items = quiz
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let user_answer = self.ledger.get(index).map(|r| r.selected_option_text.clone());
                let correct_answer = question.correct_option().map(|opt| opt.text.clone());
                ReviewItem {
                    index,
                    question: question.text.clone(),
                    media_url: question.media_url.clone(),
                    correct: user_answer.is_some() && user_answer == correct_answer,
                    user_answer,
                    correct_answer,
                    explanation: question.explanation.as_deref().map(clean_html),
                }
            })
            .collect();

        let learning_stats = match &self.grading {
            GradingState::Graded { result } => result.learning_stats.clone(),
            _ => None,
        };

        Ok(SessionReview {
            session_id: self.id,
            quiz_id: self.quiz_id.clone(),
            grading: self.grading.clone(),
            max_combo: self.combo.max(),
            items,
            learning_stats,
        })
    }
}
