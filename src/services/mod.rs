// src/services/mod.rs

pub mod quiz_api;

pub use quiz_api::{HttpQuizService, QuizService};
