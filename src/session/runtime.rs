// src/session/runtime.rs

use std::future;
use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Duration, Instant, sleep_until},
};
use uuid::Uuid;

use crate::{
    config::SessionTiming,
    error::AppError,
    models::{
        result::ResultSummary,
        session::{SelectOutcome, SessionReview, SessionSnapshot, SubmitTrigger},
    },
    services::QuizService,
    session::machine::SessionMachine,
};

const COMMAND_BUFFER: usize = 32;

/// Requests a surface can make of a running session.
#[derive(Debug)]
enum Command {
    Snapshot(oneshot::Sender<SessionSnapshot>),
    TogglePause(oneshot::Sender<SessionSnapshot>),
    SelectAnswer {
        index: usize,
        text: String,
        reply: oneshot::Sender<Result<SelectOutcome, AppError>>,
    },
    Next(oneshot::Sender<SessionSnapshot>),
    Previous(oneshot::Sender<SessionSnapshot>),
    Submit(oneshot::Sender<SessionSnapshot>),
    Review(oneshot::Sender<Result<SessionReview, AppError>>),
    Abandon(oneshot::Sender<()>),
}

/// Cheap, cloneable handle to a running session.
///
/// The session lives in its own task and processes one event at a time.
/// When the last handle is dropped the session is abandoned.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    quiz_id: String,
    owner: String,
    commands: mpsc::Sender<Command>,
}

/// Opens an attempt with the quiz service and spawns its session task.
///
/// On `Locked`/`NotFound`/`BadRequest` nothing is spawned and the session
/// never leaves `NotStarted`.
pub async fn start_session(
    service: Arc<dyn QuizService>,
    quiz_id: &str,
    owner: &str,
    timing: SessionTiming,
) -> Result<SessionHandle, AppError> {
    let id = Uuid::new_v4();
    let mut machine = SessionMachine::new(id, quiz_id, timing);

    let ticket = service.start_attempt(quiz_id).await.map_err(|e| {
        tracing::info!(session_id = %id, quiz_id, "Quiz start refused: {}", e.message());
        e
    })?;
    machine.start(ticket, Instant::now())?;

    tracing::info!(
        session_id = %id,
        quiz_id,
        owner,
        time_limit = machine.time_remaining_seconds(),
        "Session started"
    );

    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let runner = SessionRunner {
        machine,
        service,
        commands: rx,
        grading: None,
        awaiting_result: Vec::new(),
        retention: timing.result_retention,
        expires_at: None,
    };
    tokio::spawn(runner.run());

    Ok(SessionHandle {
        id,
        quiz_id: quiz_id.to_string(),
        owner: owner.to_string(),
        commands: tx,
    })
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// `true` once the session task has ended.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Resolves when the session task ends, for whatever reason.
    pub async fn closed(&self) {
        self.commands.closed().await
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, AppError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ended())?;
        response.await.map_err(|_| ended())
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, AppError> {
        self.request(Command::Snapshot).await
    }

    pub async fn toggle_pause(&self) -> Result<SessionSnapshot, AppError> {
        self.request(Command::TogglePause).await
    }

    pub async fn select_answer(&self, index: usize, text: &str) -> Result<SelectOutcome, AppError> {
        let text = text.to_string();
        self.request(|reply| Command::SelectAnswer { index, text, reply })
            .await?
    }

    pub async fn next(&self) -> Result<SessionSnapshot, AppError> {
        self.request(Command::Next).await
    }

    pub async fn previous(&self) -> Result<SessionSnapshot, AppError> {
        self.request(Command::Previous).await
    }

    /// Manual submit. Resolves once grading has finished (or failed).
    pub async fn submit(&self) -> Result<SessionSnapshot, AppError> {
        self.request(Command::Submit).await
    }

    pub async fn review(&self) -> Result<SessionReview, AppError> {
        self.request(Command::Review).await?
    }

    /// Stops the clock and ends the session task. No grading call is made.
    pub async fn abandon(&self) -> Result<(), AppError> {
        self.request(Command::Abandon).await
    }
}

fn ended() -> AppError {
    AppError::NotFound("Session has ended".to_string())
}

/// The task that owns one `SessionMachine`.
struct SessionRunner {
    machine: SessionMachine,
    service: Arc<dyn QuizService>,
    commands: mpsc::Receiver<Command>,
    grading: Option<JoinHandle<Result<ResultSummary, AppError>>>,
    /// Manual submitters waiting for the grading result.
    awaiting_result: Vec<oneshot::Sender<SessionSnapshot>>,
    retention: Duration,
    /// Set once grading settles; the task ends when it passes.
    expires_at: Option<Instant>,
}

impl SessionRunner {
    async fn run(mut self) {
        let session_id = self.machine.id();
        loop {
            let feedback_deadline = self.machine.feedback_deadline();
            let expires_at = self.expires_at;

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Abandon(reply)) => {
                        self.abandon();
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command),
                    None => {
                        self.abandon();
                        break;
                    }
                },
                event = self.machine.next_tick() => {
                    if let Some(trigger) = self.machine.on_clock(event) {
                        tracing::info!(%session_id, "Time expired");
                        self.begin_submit(trigger);
                    }
                },
                _ = wait_for(feedback_deadline) => {
                    self.machine.close_feedback(Instant::now());
                },
                outcome = join_grading(&mut self.grading) => {
                    self.grading = None;
                    self.finish_submit(outcome);
                },
                _ = wait_for(expires_at) => {
                    tracing::debug!(%session_id, "Result retention elapsed");
                    self.abandon();
                    break;
                },
            }
        }
    }

    fn handle(&mut self, command: Command) {
        let now = Instant::now();
        match command {
            Command::Snapshot(reply) => {
                let _ = reply.send(self.machine.snapshot(now));
            }
            Command::TogglePause(reply) => {
                let status = self.machine.toggle_pause();
                tracing::debug!(session_id = %self.machine.id(), ?status, "Pause toggled");
                let _ = reply.send(self.machine.snapshot(now));
            }
            Command::SelectAnswer { index, text, reply } => {
                let outcome = self.machine.select_answer(index, &text, now);
                if let Ok(SelectOutcome::Recorded(feedback)) = &outcome {
                    tracing::debug!(
                        session_id = %self.machine.id(),
                        index,
                        correct = feedback.correct,
                        combo = feedback.combo_count,
                        "Answer recorded"
                    );
                }
                let _ = reply.send(outcome);
            }
            Command::Next(reply) => {
                self.machine.next();
                let _ = reply.send(self.machine.snapshot(now));
            }
            Command::Previous(reply) => {
                self.machine.previous();
                let _ = reply.send(self.machine.snapshot(now));
            }
            Command::Submit(reply) => {
                if self.begin_submit(SubmitTrigger::Manual) || self.grading.is_some() {
                    self.awaiting_result.push(reply);
                } else {
                    let _ = reply.send(self.machine.snapshot(now));
                }
            }
            Command::Review(reply) => {
                let _ = reply.send(self.machine.review());
            }
            // Handled by the loop, which has to stop afterwards.
            Command::Abandon(reply) => {
                let _ = reply.send(());
            }
        }
    }

    /// Flips the machine to `Completed` and sends the ledger for grading.
    /// Returns `false` when the session had already ended.
    fn begin_submit(&mut self, trigger: SubmitTrigger) -> bool {
        let Some(submission) = self.machine.begin_submit(trigger, Instant::now()) else {
            return false;
        };
        tracing::info!(
            session_id = %self.machine.id(),
            quiz_id = self.machine.quiz_id(),
            ?trigger,
            answered = self.machine.ledger().answered_count(),
            elapsed_ms = submission.elapsed_ms,
            "Submitting attempt for grading"
        );

        let service = Arc::clone(&self.service);
        self.grading = Some(tokio::spawn(async move {
            service.submit_attempt(&submission).await
        }));
        true
    }

    fn finish_submit(&mut self, outcome: Result<ResultSummary, AppError>) {
        match &outcome {
            Ok(result) => tracing::info!(
                session_id = %self.machine.id(),
                percentage = result.percentage,
                passed = result.passed,
                "Attempt graded"
            ),
            Err(err) => tracing::warn!(
                session_id = %self.machine.id(),
                "Attempt could not be graded: {}",
                err.message()
            ),
        }
        self.machine.finish_submit(outcome);
        self.expires_at = Some(Instant::now() + self.retention);

        let snapshot = self.machine.snapshot(Instant::now());
        for reply in self.awaiting_result.drain(..) {
            let _ = reply.send(snapshot.clone());
        }
    }

    fn abandon(&mut self) {
        self.machine.abandon();
        tracing::info!(
            session_id = %self.machine.id(),
            status = ?self.machine.status(),
            "Session discarded"
        );
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

async fn join_grading(
    task: &mut Option<JoinHandle<Result<ResultSummary, AppError>>>,
) -> Result<ResultSummary, AppError> {
    match task.as_mut() {
        Some(handle) => handle
            .await
            .map_err(|e| AppError::GradingFailed(format!("Grading task failed: {}", e)))?,
        None => future::pending().await,
    }
}
