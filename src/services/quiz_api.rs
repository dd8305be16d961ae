// src/services/quiz_api.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use url::Url;

use crate::{
    config::Config,
    error::AppError,
    models::{
        quiz::{AttemptTicket, QuizDefinition},
        result::ResultSummary,
        session::Submission,
    },
};

/// The remote quiz service: loads definitions, opens attempts and grades them.
#[async_trait]
pub trait QuizService: Send + Sync {
    /// Loads a quiz for preview. Fails with `Locked`, `NotFound` or `BadRequest`.
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<QuizDefinition, AppError>;

    /// Opens an attempt; the returned definition is authoritative for it.
    async fn start_attempt(&self, quiz_id: &str) -> Result<AttemptTicket, AppError>;

    /// Grades a finished attempt. Any failure is reported as `GradingFailed`.
    async fn submit_attempt(&self, submission: &Submission) -> Result<ResultSummary, AppError>;
}

/// `{ success, data, message }` wrapper used by every quiz service response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

/// `QuizService` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpQuizService {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpQuizService {
    pub fn new(base_url: Url, token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.quiz_api_url.clone(),
            config.quiz_api_token.clone(),
            config.request_timeout,
        )
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InternalServerError("Quiz API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request and unwraps the envelope, mapping HTTP failures onto `AppError`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let envelope: Option<Envelope<T>> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let message = envelope.and_then(|e| e.message);
            return Err(map_failure(status, message));
        }

        let envelope = envelope.ok_or_else(|| {
            AppError::Upstream(format!("Unreadable response from quiz service ({})", status))
        })?;
        match envelope.data {
            Some(data) if envelope.success => Ok(data),
            _ => Err(AppError::Upstream(
                envelope
                    .message
                    .unwrap_or_else(|| "Quiz service returned no data".to_string()),
            )),
        }
    }
}

/// Maps a non-success status from the quiz service to the engine's taxonomy.
fn map_failure(status: StatusCode, message: Option<String>) -> AppError {
    match status {
        StatusCode::FORBIDDEN => AppError::Locked(
            message.unwrap_or_else(|| "Quiz is locked. Complete prerequisites to unlock.".to_string()),
        ),
        StatusCode::NOT_FOUND => {
            AppError::NotFound(message.unwrap_or_else(|| "Quiz not found".to_string()))
        }
        StatusCode::BAD_REQUEST => AppError::BadRequest(
            message.unwrap_or_else(|| "Unable to start this quiz (Bad Request).".to_string()),
        ),
        StatusCode::UNAUTHORIZED => {
            AppError::AuthError(message.unwrap_or_else(|| "Quiz service refused credentials".to_string()))
        }
        other => AppError::Upstream(
            message.unwrap_or_else(|| format!("Quiz service failed (status {})", other.as_u16())),
        ),
    }
}

#[async_trait]
impl QuizService for HttpQuizService {
    async fn fetch_quiz(&self, quiz_id: &str) -> Result<QuizDefinition, AppError> {
        let url = self.endpoint(&["quiz", quiz_id])?;
        let quiz: QuizDefinition = self.send(self.client.get(url)).await?;
        quiz.check().map_err(|e| {
            tracing::warn!(quiz_id, "Quiz service sent an invalid definition: {}", e.message());
            AppError::Upstream(format!("Invalid quiz definition: {}", e.message()))
        })?;
        Ok(quiz)
    }

    async fn start_attempt(&self, quiz_id: &str) -> Result<AttemptTicket, AppError> {
        let url = self.endpoint(&["quiz", "start"])?;
        let request = self.client.post(url).json(&json!({ "quizId": quiz_id }));
        let ticket: AttemptTicket = self.send(request).await?;
        ticket.quiz.check().map_err(|e| {
            tracing::warn!(quiz_id, "Quiz service opened an invalid attempt: {}", e.message());
            AppError::Upstream(format!("Invalid quiz definition: {}", e.message()))
        })?;
        Ok(ticket)
    }

    async fn submit_attempt(&self, submission: &Submission) -> Result<ResultSummary, AppError> {
        let url = self.endpoint(&["quiz", "submit"])?;
        let request = self.client.post(url).json(submission);
        self.send(request)
            .await
            .map_err(|e| AppError::GradingFailed(e.message().to_string()))
    }
}
