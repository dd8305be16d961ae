// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, models::quiz::PublicQuiz, services::QuizService};

/// Loads a quiz for the start screen.
///
/// Returns title, time limit and questions without the answer key, so the
/// surface can show what the attempt will look like before it begins.
pub async fn get_quiz(
    State(service): State<Arc<dyn QuizService>>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = service.fetch_quiz(&quiz_id).await.map_err(|e| {
        tracing::info!(quiz_id, "Failed to load quiz: {}", e.message());
        e
    })?;

    Ok(Json(PublicQuiz::from(&quiz)))
}
