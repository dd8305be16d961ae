// src/session/registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::SessionTiming,
    error::AppError,
    models::session::GradingState,
    services::QuizService,
    session::runtime::{SessionHandle, start_session},
};

/// Live sessions, keyed by id. Each belongs to exactly one owner.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `owner`.
    ///
    /// At most one live session per owner and quiz exists at a time. With
    /// `replace` the live one is abandoned first; without it the start fails
    /// with `Conflict`. A session whose grading has settled is replaced
    /// silently.
    pub async fn open(
        &self,
        service: Arc<dyn QuizService>,
        owner: &str,
        quiz_id: &str,
        replace: bool,
        timing: SessionTiming,
    ) -> Result<SessionHandle, AppError> {
        if let Some(existing) = self.find_for_quiz(owner, quiz_id).await {
            if !replace && is_live(&existing).await {
                return Err(AppError::Conflict(format!(
                    "A session for quiz '{}' already exists",
                    quiz_id
                )));
            }
            tracing::info!(session_id = %existing.id(), quiz_id, "Replacing existing session");
            // It may have been evicted in the meantime.
            let _ = self.close(existing.id(), owner).await;
        }

        let handle = start_session(service, quiz_id, owner, timing).await?;

        let mut sessions = self.sessions.write().await;
        let raced = sessions
            .values()
            .any(|s| s.owner() == owner && s.quiz_id() == quiz_id);
        if raced {
            drop(sessions);
            let _ = handle.abandon().await;
            return Err(AppError::Conflict(format!(
                "A session for quiz '{}' already exists",
                quiz_id
            )));
        }
        sessions.insert(handle.id(), handle.clone());
        drop(sessions);

        self.evict_when_closed(handle.clone());
        Ok(handle)
    }

    /// Forgets the session once its task ends (retention elapsed, abandon).
    fn evict_when_closed(&self, handle: SessionHandle) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            handle.closed().await;
            let id = handle.id();
            if sessions.write().await.remove(&id).is_some() {
                tracing::debug!(session_id = %id, "Session evicted");
            }
        });
    }

    /// Looks up a session. Sessions of other owners are reported as missing.
    pub async fn get(&self, id: Uuid, owner: &str) -> Result<SessionHandle, AppError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .filter(|s| s.owner() == owner)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
    }

    /// Any session of `owner` for `quiz_id`, finished or not.
    pub async fn find_for_quiz(&self, owner: &str, quiz_id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .find(|s| s.owner() == owner && s.quiz_id() == quiz_id)
            .cloned()
    }

    /// Abandons and forgets a session.
    pub async fn close(&self, id: Uuid, owner: &str) -> Result<(), AppError> {
        let handle = {
            let mut sessions = self.sessions.write().await;
            match sessions.get(&id) {
                Some(s) if s.owner() == owner => sessions.remove(&id),
                _ => None,
            }
        }
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))?;

        // The task may already be gone; the session is discarded either way.
        let _ = handle.abandon().await;
        Ok(())
    }

    /// Number of sessions currently held.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// A session blocks a new start until its grading has settled.
async fn is_live(handle: &SessionHandle) -> bool {
    if handle.is_closed() {
        return false;
    }
    match handle.snapshot().await {
        Ok(snapshot) => !matches!(
            snapshot.grading,
            GradingState::Graded { .. } | GradingState::Failed { .. }
        ),
        Err(_) => false,
    }
}
