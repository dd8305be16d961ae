// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::session::{SelectAnswerRequest, StartSessionRequest},
    services::QuizService,
    session::SessionRegistry,
    utils::jwt::Claims,
};

/// Starts a timed attempt.
///
/// * Opens the attempt with the quiz service (which may refuse it as locked).
/// * Seeds the countdown and starts the clock.
/// * Fails with 409 if the caller already holds a session for this quiz,
///   unless `replace` is set.
pub async fn start_session(
    State(sessions): State<SessionRegistry>,
    State(service): State<Arc<dyn QuizService>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let handle = sessions
        .open(service, &claims.sub, &payload.quiz_id, payload.replace, config.timing)
        .await?;
    let snapshot = handle.snapshot().await?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Returns the read-only view of a session.
pub async fn get_session(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions.get(id, &claims.sub).await?;
    Ok(Json(handle.snapshot().await?))
}

/// Pauses a running countdown, or resumes a paused one.
pub async fn toggle_pause(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions.get(id, &claims.sub).await?;
    Ok(Json(handle.toggle_pause().await?))
}

/// Records an answer and returns immediate feedback.
pub async fn select_answer(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let handle = sessions.get(id, &claims.sub).await?;
    let outcome = handle.select_answer(payload.index, &payload.text).await?;
    Ok(Json(outcome))
}

pub async fn next_question(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions.get(id, &claims.sub).await?;
    Ok(Json(handle.next().await?))
}

pub async fn previous_question(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions.get(id, &claims.sub).await?;
    Ok(Json(handle.previous().await?))
}

/// Submits the attempt from the last question and waits for the grade.
///
/// A second submit (or one racing the timeout) returns the same outcome
/// without grading twice.
pub async fn submit_session(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions.get(id, &claims.sub).await?;
    Ok(Json(handle.submit().await?))
}

/// Results screen data: grade, per-question review and best combo.
pub async fn get_review(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let handle = sessions.get(id, &claims.sub).await?;
    Ok(Json(handle.review().await?))
}

/// Abandons the session. Nothing is sent for grading.
pub async fn abandon_session(
    State(sessions): State<SessionRegistry>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    sessions.close(id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}
