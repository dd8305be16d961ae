// tests/session_tests.rs

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeQuizService, quiz};
use quiz_engine::{
    config::SessionTiming,
    error::AppError,
    models::session::{GradingState, SelectOutcome, SessionStatus, SubmittedAnswer},
    services::QuizService,
    session::{SessionRegistry, start_session},
};
use tokio::time::sleep;

fn timing() -> SessionTiming {
    SessionTiming::default()
}

fn service(fake: &FakeQuizService) -> Arc<dyn QuizService> {
    Arc::new(fake.clone())
}

fn recorded(outcome: SelectOutcome) -> quiz_engine::models::session::AnswerFeedback {
    match outcome {
        SelectOutcome::Recorded(feedback) => feedback,
        SelectOutcome::Ignored => panic!("answer was ignored"),
    }
}

#[tokio::test(start_paused = true)]
async fn happy_path_grades_once_with_three_entries() {
    // Arrange: 3 questions, 2 minutes
    let fake = FakeQuizService::new(vec![quiz("q3", 3, 120)]);
    let handle = start_session(service(&fake), "q3", "alice", timing()).await.unwrap();

    // Act
    let first = recorded(handle.select_answer(0, "A0").await.unwrap());
    assert!(first.correct);
    assert_eq!((first.combo_count, first.max_combo), (1, 1));
    sleep(Duration::from_millis(1600)).await;
    assert_eq!(handle.snapshot().await.unwrap().current_index, 1);

    let second = recorded(handle.select_answer(1, "B1").await.unwrap());
    assert!(!second.correct);
    assert_eq!(second.correct_option.as_deref(), Some("A1"));
    assert_eq!((second.combo_count, second.max_combo), (0, 1));
    sleep(Duration::from_millis(1600)).await;
    assert_eq!(handle.snapshot().await.unwrap().current_index, 2);

    let third = recorded(handle.select_answer(2, "A2").await.unwrap());
    assert_eq!((third.combo_count, third.max_combo), (1, 1));

    let done = handle.submit().await.unwrap();

    // Assert
    assert_eq!(done.status, SessionStatus::Completed);
    assert!(matches!(done.grading, GradingState::Graded { .. }));
    assert_eq!(done.max_combo, 1);
    assert_eq!(fake.submit_calls(), 1);
    let submission = &fake.submissions()[0];
    assert_eq!(submission.quiz_id, "q3");
    assert_eq!(submission.answers.len(), 3);
    assert!(submission.answers.iter().all(SubmittedAnswer::is_answered));
}

#[tokio::test(start_paused = true)]
async fn timeout_submits_unanswered_ledger_once() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 1)]);
    let handle = start_session(service(&fake), "q1", "alice", timing()).await.unwrap();

    sleep(Duration::from_millis(1100)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.time_remaining_seconds, 0);
    assert!(matches!(snapshot.grading, GradingState::Graded { .. }));
    assert_eq!(fake.submit_calls(), 1);
    assert_eq!(fake.submissions()[0].answers, vec![SubmittedAnswer::default()]);
    let body = serde_json::to_value(&fake.submissions()[0]).unwrap();
    assert_eq!(body["answers"][0], serde_json::json!({ "selectedAnswer": null, "timeSpent": 0 }));

    // A late manual submit is a silent no-op.
    let again = handle.submit().await.unwrap();
    assert_eq!(again.status, SessionStatus::Completed);
    assert_eq!(fake.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn manual_submit_racing_timeout_grades_once() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 1)]).with_grading_delay(Duration::from_secs(3));
    let handle = start_session(service(&fake), "q1", "alice", timing()).await.unwrap();
    handle.select_answer(0, "A0").await.unwrap();

    let racer = handle.clone();
    let manual = tokio::spawn(async move {
        sleep(Duration::from_secs(1)).await;
        racer.submit().await
    });
    sleep(Duration::from_millis(1100)).await;
    let late = handle.submit().await.unwrap();
    let manual = manual.await.unwrap().unwrap();

    assert_eq!(fake.submit_calls(), 1);
    assert!(matches!(late.grading, GradingState::Graded { .. }));
    assert!(matches!(manual.grading, GradingState::Graded { .. }));
    assert_eq!(fake.submissions()[0].answers.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_manual_submits_grade_once() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 60)]).with_grading_delay(Duration::from_secs(2));
    let handle = start_session(service(&fake), "q1", "alice", timing()).await.unwrap();
    handle.select_answer(0, "A0").await.unwrap();

    let (a, b) = tokio::join!(handle.submit(), handle.submit());

    assert_eq!(a.unwrap().grading, b.unwrap().grading);
    assert_eq!(fake.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn grading_pending_is_visible() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 1)]).with_grading_delay(Duration::from_secs(5));
    let handle = start_session(service(&fake), "q1", "alice", timing()).await.unwrap();

    sleep(Duration::from_millis(1500)).await;
    let snapshot = handle.snapshot().await.unwrap();

    assert_eq!(snapshot.status, SessionStatus::Completed);
    assert_eq!(snapshot.grading, GradingState::Pending);
}

#[tokio::test(start_paused = true)]
async fn pause_does_not_consume_time() {
    let fake = FakeQuizService::new(vec![quiz("q3", 3, 60)]);
    let handle = start_session(service(&fake), "q3", "alice", timing()).await.unwrap();

    sleep(Duration::from_millis(2100)).await;
    assert_eq!(handle.snapshot().await.unwrap().time_remaining_seconds, 58);

    let paused = handle.toggle_pause().await.unwrap();
    assert_eq!(paused.status, SessionStatus::Paused);
    sleep(Duration::from_secs(30)).await;
    assert_eq!(handle.snapshot().await.unwrap().time_remaining_seconds, 58);

    let resumed = handle.toggle_pause().await.unwrap();
    assert_eq!(resumed.status, SessionStatus::InProgress);
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(handle.snapshot().await.unwrap().time_remaining_seconds, 57);
}

#[tokio::test(start_paused = true)]
async fn feedback_window_keeps_running_while_paused() {
    let fake = FakeQuizService::new(vec![quiz("q3", 3, 60)]);
    let handle = start_session(service(&fake), "q3", "alice", timing()).await.unwrap();

    handle.select_answer(0, "A0").await.unwrap();
    handle.toggle_pause().await.unwrap();
    sleep(Duration::from_millis(1600)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.status, SessionStatus::Paused);
    assert_eq!(snapshot.current_index, 1);
    assert!(snapshot.feedback.is_none());
}

#[tokio::test(start_paused = true)]
async fn reselect_during_feedback_is_ignored() {
    let fake = FakeQuizService::new(vec![quiz("q3", 3, 60)]);
    let handle = start_session(service(&fake), "q3", "alice", timing()).await.unwrap();

    handle.select_answer(0, "B0").await.unwrap();
    let again = handle.select_answer(0, "A0").await.unwrap();

    assert_eq!(again, SelectOutcome::Ignored);
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.ledger[0].as_ref().unwrap().selected_option_text, "B0");
    assert_eq!(snapshot.combo_count, 0);
}

#[tokio::test(start_paused = true)]
async fn next_is_noop_until_answered() {
    let fake = FakeQuizService::new(vec![quiz("q3", 3, 60)]);
    let handle = start_session(service(&fake), "q3", "alice", timing()).await.unwrap();

    assert_eq!(handle.next().await.unwrap().current_index, 0);
    assert_eq!(handle.previous().await.unwrap().current_index, 0);

    handle.select_answer(0, "A0").await.unwrap();
    assert_eq!(handle.next().await.unwrap().current_index, 1);
    assert_eq!(handle.previous().await.unwrap().current_index, 0);
}

#[tokio::test(start_paused = true)]
async fn abandon_never_grades() {
    let fake = FakeQuizService::new(vec![quiz("q5", 5, 60)]);
    let handle = start_session(service(&fake), "q5", "alice", timing()).await.unwrap();
    handle.select_answer(0, "A0").await.unwrap();

    handle.abandon().await.unwrap();
    sleep(Duration::from_secs(120)).await;

    assert_eq!(fake.submit_calls(), 0);
    assert!(matches!(handle.snapshot().await, Err(AppError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_discards_session() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 1)]);
    let handle = start_session(service(&fake), "q1", "alice", timing()).await.unwrap();

    drop(handle);
    sleep(Duration::from_secs(5)).await;

    assert_eq!(fake.submit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn locked_quiz_never_starts() {
    let fake = FakeQuizService::new(vec![quiz("adv", 2, 60)]);
    fake.lock("adv");

    let result = start_session(service(&fake), "adv", "alice", timing()).await;
    assert!(matches!(result, Err(AppError::Locked(msg)) if msg.contains("unlock")));

    let missing = start_session(service(&fake), "nope", "alice", timing()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn grading_failure_keeps_session_completed() {
    let fake = FakeQuizService::new(vec![quiz("q2", 2, 60)]).failing_grades();
    let handle = start_session(service(&fake), "q2", "alice", timing()).await.unwrap();

    handle.select_answer(0, "A0").await.unwrap();
    handle.next().await.unwrap();
    let done = handle.submit().await.unwrap();

    assert_eq!(done.status, SessionStatus::Completed);
    assert!(matches!(done.grading, GradingState::Failed { ref message } if message.contains("unavailable")));

    let review = handle.review().await.unwrap();
    assert_eq!(review.items.len(), 2);
    assert_eq!(review.items[0].user_answer.as_deref(), Some("A0"));
    assert!(review.items[1].user_answer.is_none());
    assert_eq!(review.max_combo, 1);
    assert_eq!(fake.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn registry_enforces_one_session_per_quiz() {
    let fake = FakeQuizService::new(vec![quiz("q2", 2, 60)]);
    let registry = SessionRegistry::new();

    let first = registry.open(service(&fake), "alice", "q2", false, timing()).await.unwrap();
    let second = registry.open(service(&fake), "alice", "q2", false, timing()).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    // Another owner is independent.
    registry.open(service(&fake), "bob", "q2", false, timing()).await.unwrap();
    assert!(matches!(registry.get(first.id(), "bob").await, Err(AppError::NotFound(_))));

    // Explicit replacement abandons the first attempt without grading it.
    let replaced = registry.open(service(&fake), "alice", "q2", true, timing()).await.unwrap();
    assert_ne!(replaced.id(), first.id());
    assert!(matches!(first.snapshot().await, Err(AppError::NotFound(_))));
    assert_eq!(registry.count().await, 2);
    assert_eq!(fake.submit_calls(), 0);

    registry.close(replaced.id(), "alice").await.unwrap();
    assert_eq!(registry.count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn graded_sessions_are_evicted_after_retention() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 1)]);
    let registry = SessionRegistry::new();
    let timing = SessionTiming {
        result_retention: Duration::from_secs(5),
        ..SessionTiming::default()
    };

    let mut handles = Vec::new();
    for owner in ["alice", "bob", "carol"] {
        handles.push(registry.open(service(&fake), owner, "q1", false, timing).await.unwrap());
    }

    sleep(Duration::from_millis(1100)).await;
    assert_eq!(registry.count().await, 3);
    for handle in &handles {
        assert!(matches!(handle.snapshot().await.unwrap().grading, GradingState::Graded { .. }));
    }

    sleep(Duration::from_secs(6)).await;
    assert_eq!(registry.count().await, 0);
    assert!(matches!(handles[0].snapshot().await, Err(AppError::NotFound(_))));
    assert_eq!(fake.submit_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn graded_session_does_not_block_a_new_attempt() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 1)]);
    let registry = SessionRegistry::new();

    let first = registry.open(service(&fake), "alice", "q1", false, timing()).await.unwrap();
    sleep(Duration::from_millis(1100)).await;

    let second = registry.open(service(&fake), "alice", "q1", false, timing()).await.unwrap();

    assert_ne!(second.id(), first.id());
    assert_eq!(registry.count().await, 1);
    assert_eq!(fake.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_tick_interval_does_not_panic() {
    let fake = FakeQuizService::new(vec![quiz("q1", 1, 2)]);
    let timing = SessionTiming {
        tick_interval: Duration::ZERO,
        ..SessionTiming::default()
    };

    let handle = start_session(service(&fake), "q1", "alice", timing).await.unwrap();
    sleep(Duration::from_millis(1100)).await;

    assert_eq!(handle.snapshot().await.unwrap().time_remaining_seconds, 1);
}
