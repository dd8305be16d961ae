// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use quiz_engine::{
    error::AppError,
    models::{
        quiz::{AnswerOption, AttemptTicket, LearningContext, Question, QuizDefinition},
        result::ResultSummary,
        session::Submission,
    },
    services::QuizService,
};

/// Builds a quiz whose correct answer for question `i` is `"A{i}"`.
pub fn quiz(id: &str, questions: usize, time_limit_seconds: u32) -> QuizDefinition {
    QuizDefinition {
        id: id.to_string(),
        title: format!("Quiz {}", id),
        description: None,
        time_limit: None,
        time_limit_seconds: Some(time_limit_seconds),
        questions: (0..questions)
            .map(|i| Question {
                text: format!("Question {}", i),
                options: vec![
                    AnswerOption { text: format!("A{}", i), is_correct: true },
                    AnswerOption { text: format!("B{}", i), is_correct: false },
                ],
                explanation: Some(format!("A{} is right", i)),
                media_url: None,
                points: 10,
            })
            .collect(),
    }
}

/// In-memory quiz service that records every grading request.
#[derive(Clone)]
pub struct FakeQuizService {
    quizzes: Arc<Mutex<Vec<QuizDefinition>>>,
    locked: Arc<Mutex<Vec<String>>>,
    submissions: Arc<Mutex<Vec<Submission>>>,
    submit_calls: Arc<AtomicUsize>,
    grading_delay: Duration,
    grading_fails: bool,
}

impl FakeQuizService {
    pub fn new(quizzes: Vec<QuizDefinition>) -> Self {
        Self {
            quizzes: Arc::new(Mutex::new(quizzes)),
            locked: Arc::new(Mutex::new(Vec::new())),
            submissions: Arc::new(Mutex::new(Vec::new())),
            submit_calls: Arc::new(AtomicUsize::new(0)),
            grading_delay: Duration::ZERO,
            grading_fails: false,
        }
    }

    pub fn with_grading_delay(mut self, delay: Duration) -> Self {
        self.grading_delay = delay;
        self
    }

    pub fn failing_grades(mut self) -> Self {
        self.grading_fails = true;
        self
    }

    pub fn lock(&self, quiz_id: &str) {
        self.locked.lock().unwrap().push(quiz_id.to_string());
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    fn find(&self, quiz_id: &str) -> Result<QuizDefinition, AppError> {
        if self.locked.lock().unwrap().iter().any(|id| id == quiz_id) {
            return Err(AppError::Locked("Pass 2 alphabet quizzes to unlock".to_string()));
        }
        self.quizzes
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }
}

#[async_trait]
impl QuizService for FakeQuizService {
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<QuizDefinition, AppError> {
        self.find(quiz_id)
    }

    async fn start_attempt(&self, quiz_id: &str) -> Result<AttemptTicket, AppError> {
        let quiz = self.find(quiz_id)?;
        Ok(AttemptTicket {
            quiz,
            attempt_number: Some(1),
            max_attempts: Some(3),
            learning: LearningContext::default(),
        })
    }

    async fn submit_attempt(&self, submission: &Submission) -> Result<ResultSummary, AppError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().unwrap().push(submission.clone());
        if !self.grading_delay.is_zero() {
            tokio::time::sleep(self.grading_delay).await;
        }
        if self.grading_fails {
            return Err(AppError::GradingFailed("Grading service unavailable".to_string()));
        }

        let answered = submission.answers.iter().filter(|a| a.is_answered()).count();
        Ok(ResultSummary {
            percentage: answered as f64 / submission.answers.len().max(1) as f64 * 100.0,
            passed: answered == submission.answers.len(),
            xp_earned: 10 * answered as u32,
            ..Default::default()
        })
    }
}
