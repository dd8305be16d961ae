use std::sync::Arc;

use crate::{config::Config, services::QuizService, session::SessionRegistry};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn QuizService>,
    pub sessions: SessionRegistry,
    pub config: Config,
}

impl FromRef<AppState> for Arc<dyn QuizService> {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for SessionRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
