use crate::answers::AnswerStore;
use crate::api::QuizApi;
use crate::error::SessionError;
use crate::models::{Answer, AnswerValue, Question, Quiz, QuizResult, Submission};
use crate::navigator::QuestionNavigator;
use crate::timer::{CountdownTimer, TickFlow, TICK};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Loading,
    NotStarted,
    InProgress,
    Submitting,
    Completed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Loading => "loading",
            SessionState::NotStarted => "not_started",
            SessionState::InProgress => "in_progress",
            SessionState::Submitting => "submitting",
            SessionState::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    Loaded {
        quiz_id: String,
        title: String,
        question_count: usize,
        remaining_seconds: u32,
    },
    NavigateToQuizList { reason: String },
    Started { remaining_seconds: u32 },
    Tick { remaining_seconds: u32 },
    Expired,
    Submitting { answer_count: usize, total_time_seconds: u32 },
    SubmitFailed { message: String },
    Completed(QuizResult),
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Completed(QuizResult),
    /// The session was not in progress (already submitting, completed, ...).
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub quiz_id: String,
    pub state: SessionState,
    pub current_index: usize,
    pub question_count: usize,
    pub answered: usize,
    pub remaining_seconds: u32,
    pub time_limit_seconds: u32,
    pub timer_running: bool,
    pub result: Option<QuizResult>,
}

struct Inner {
    state: SessionState,
    closed: bool,
    quiz: Option<Quiz>,
    questions: Vec<Question>,
    navigator: QuestionNavigator,
    answers: AnswerStore,
    remaining_seconds: u32,
    result: Option<QuizResult>,
    timer: CountdownTimer,
}

impl Inner {
    fn time_limit_seconds(&self) -> u32 {
        self.quiz.as_ref().map(Quiz::time_limit_seconds).unwrap_or(0)
    }

    fn elapsed_seconds(&self) -> u32 {
        self.time_limit_seconds().saturating_sub(self.remaining_seconds)
    }

    fn accepts_input(&self) -> bool {
        self.state == SessionState::InProgress && !self.closed
    }
}

struct Shared {
    quiz_id: String,
    api: Arc<dyn QuizApi>,
    events: broadcast::Sender<SessionEvent>,
    inner: Mutex<Inner>,
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Caller holds the lock. The tick task only keeps a weak handle so a
    /// dropped session ends it.
    fn arm_timer(self: &Arc<Self>, inner: &mut Inner) {
        let weak = Arc::downgrade(self);
        inner.timer.start(TICK, move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(shared) => shared.on_tick().await,
                    None => TickFlow::Stop,
                }
            }
        });
    }

    async fn on_tick(self: &Arc<Self>) -> TickFlow {
        let remaining = {
            let mut inner = self.inner.lock().await;
            if !inner.accepts_input() {
                return TickFlow::Stop;
            }
            inner.remaining_seconds = inner.remaining_seconds.saturating_sub(1);
            inner.remaining_seconds
        };
        self.emit(SessionEvent::Tick { remaining_seconds: remaining });
        if remaining > 0 {
            return TickFlow::Continue;
        }

        info!("quiz {} time limit reached, submitting", self.quiz_id);
        self.emit(SessionEvent::Expired);
        // Submitting stops this timer, so it runs on its own task.
        let shared = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = shared.submit().await {
                warn!("automatic submission of quiz {} failed: {}", shared.quiz_id, err);
            }
        });
        TickFlow::Stop
    }

    async fn submit(self: &Arc<Self>) -> Result<SubmitOutcome, SessionError> {
        let submission = {
            let mut inner = self.inner.lock().await;
            if !inner.accepts_input() {
                debug!("submit ignored for quiz {} in state {}", self.quiz_id, inner.state);
                return Ok(SubmitOutcome::Ignored);
            }
            inner.state = SessionState::Submitting;
            inner.timer.stop();
            Submission {
                answers: inner.answers.to_answer_list(),
                total_time_seconds: inner.elapsed_seconds(),
            }
        };

        info!(
            "submitting quiz {} with {} answers after {}s",
            self.quiz_id,
            submission.answers.len(),
            submission.total_time_seconds
        );
        self.emit(SessionEvent::Submitting {
            answer_count: submission.answers.len(),
            total_time_seconds: submission.total_time_seconds,
        });

        match self.api.submit_quiz(&self.quiz_id, &submission).await {
            Ok(result) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.state = SessionState::Completed;
                    inner.timer.stop();
                    inner.result = Some(result.clone());
                }
                info!(
                    "quiz {} completed: score {} ({}/{})",
                    self.quiz_id, result.score, result.correct_answers, result.total_questions
                );
                self.emit(SessionEvent::Completed(result.clone()));
                Ok(SubmitOutcome::Completed(result))
            }
            Err(err) => {
                {
                    let mut inner = self.inner.lock().await;
                    inner.state = SessionState::InProgress;
                    if inner.remaining_seconds > 0 && !inner.closed {
                        self.arm_timer(&mut inner);
                    }
                }
                let message = err.user_message();
                warn!("submission of quiz {} failed: {}", self.quiz_id, err);
                self.emit(SessionEvent::SubmitFailed { message });
                Err(SessionError::Submit(err))
            }
        }
    }
}

/// One attempt at one quiz. All state changes go through these methods.
pub struct QuizSession {
    shared: Arc<Shared>,
}

impl QuizSession {
    pub fn new(api: Arc<dyn QuizApi>, quiz_id: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                quiz_id: quiz_id.into(),
                api,
                events,
                inner: Mutex::new(Inner {
                    state: SessionState::Loading,
                    closed: false,
                    quiz: None,
                    questions: Vec::new(),
                    navigator: QuestionNavigator::new(0),
                    answers: AnswerStore::new(),
                    remaining_seconds: 0,
                    result: None,
                    timer: CountdownTimer::new(),
                }),
            }),
        }
    }

    pub fn quiz_id(&self) -> &str {
        &self.shared.quiz_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub async fn load(&self) -> Result<(), SessionError> {
        {
            let inner = self.shared.inner.lock().await;
            if inner.state != SessionState::Loading || inner.closed {
                debug!("load ignored for quiz {} in state {}", self.shared.quiz_id, inner.state);
                return Ok(());
            }
        }

        let quiz_id = self.shared.quiz_id.clone();
        let fetched = self.shared.api.fetch_quiz(&quiz_id).await;
        let envelope = match fetched {
            Ok(env) if env.questions.is_empty() => Err(SessionError::NotFound { quiz_id }),
            Ok(env) => Ok(env),
            Err(err) if err.status() == Some(404) => Err(SessionError::NotFound { quiz_id }),
            Err(err) => Err(SessionError::Load(err)),
        };
        let envelope = match envelope {
            Ok(env) => env,
            Err(err) => {
                warn!("leaving quiz {}: {}", self.shared.quiz_id, err);
                self.shared.emit(SessionEvent::NavigateToQuizList { reason: err.to_string() });
                return Err(err);
            }
        };

        let mut questions = envelope.questions;
        questions.sort_by_key(|q| q.order_index);
        let quiz = envelope.quiz;
        let event = SessionEvent::Loaded {
            quiz_id: self.shared.quiz_id.clone(),
            title: quiz.title.clone(),
            question_count: questions.len(),
            remaining_seconds: quiz.time_limit_seconds(),
        };
        {
            let mut inner = self.shared.inner.lock().await;
            inner.remaining_seconds = quiz.time_limit_seconds();
            inner.navigator = QuestionNavigator::new(questions.len());
            inner.questions = questions;
            inner.quiz = Some(quiz);
            inner.state = SessionState::NotStarted;
        }
        info!("quiz {} loaded", self.shared.quiz_id);
        self.shared.emit(event);
        Ok(())
    }

    /// Returns `false` unless the session was waiting to start.
    pub async fn start(&self) -> bool {
        let remaining = {
            let mut inner = self.shared.inner.lock().await;
            if inner.state != SessionState::NotStarted || inner.closed {
                debug!("start ignored for quiz {} in state {}", self.shared.quiz_id, inner.state);
                return false;
            }
            inner.state = SessionState::InProgress;
            self.shared.arm_timer(&mut inner);
            inner.remaining_seconds
        };
        info!("quiz {} started with {}s on the clock", self.shared.quiz_id, remaining);
        self.shared.emit(SessionEvent::Started { remaining_seconds: remaining });
        true
    }

    /// Records an answer. `Ok(false)` when the session is not in progress.
    pub async fn select_answer(
        &self,
        question_id: &str,
        value: AnswerValue,
    ) -> Result<bool, SessionError> {
        let mut inner = self.shared.inner.lock().await;
        if !inner.accepts_input() {
            debug!("answer ignored for quiz {} in state {}", self.shared.quiz_id, inner.state);
            return Ok(false);
        }
        let question = inner
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| SessionError::InvalidAnswer {
                question_id: question_id.to_string(),
                reason: "unknown question".into(),
            })?;
        value.fits(question).map_err(|reason| SessionError::InvalidAnswer {
            question_id: question_id.to_string(),
            reason,
        })?;
        inner.answers.set(question_id, value);
        debug!("answer recorded for {}", question_id);
        Ok(true)
    }

    pub async fn submit(&self) -> Result<SubmitOutcome, SessionError> {
        self.shared.submit().await
    }

    pub async fn next(&self) -> bool {
        self.shared.inner.lock().await.navigator.next()
    }

    pub async fn previous(&self) -> bool {
        self.shared.inner.lock().await.navigator.previous()
    }

    pub async fn jump_to(&self, index: usize) {
        self.shared.inner.lock().await.navigator.jump_to(index);
    }

    pub async fn quiz(&self) -> Option<Quiz> {
        self.shared.inner.lock().await.quiz.clone()
    }

    pub async fn current_question(&self) -> Option<Question> {
        let inner = self.shared.inner.lock().await;
        inner.questions.get(inner.navigator.current()).cloned()
    }

    pub async fn answer_for(&self, question_id: &str) -> Option<Answer> {
        self.shared.inner.lock().await.answers.get(question_id).cloned()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.shared.inner.lock().await;
        SessionSnapshot {
            quiz_id: self.shared.quiz_id.clone(),
            state: inner.state,
            current_index: inner.navigator.current(),
            question_count: inner.navigator.count(),
            answered: inner.answers.len(),
            remaining_seconds: inner.remaining_seconds,
            time_limit_seconds: inner.time_limit_seconds(),
            timer_running: inner.timer.is_running(),
            result: inner.result.clone(),
        }
    }

    /// Tears the session down: no further ticks, input is ignored.
    pub async fn close(&self) {
        {
            let mut inner = self.shared.inner.lock().await;
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.timer.stop();
        }
        info!("quiz {} session closed", self.shared.quiz_id);
        self.shared.emit(SessionEvent::Closed);
    }
}
