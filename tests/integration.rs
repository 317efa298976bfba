use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use quiz_client::api::{HttpQuizApi, QuizApi};
use quiz_client::config::ClientConfig;
use quiz_client::error::{ApiError, SessionError};
use quiz_client::models::AnswerValue;
use quiz_client::session::{QuizSession, SessionEvent, SessionState, SubmitOutcome};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use url::Url;

#[derive(Clone, Default)]
struct Backend {
    submissions: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

fn quiz_json(id: &str) -> Value {
    json!({
        "id": id,
        "title": "Ownership",
        "description": "Moves and borrows",
        "quiz_type": "lesson",
        "difficulty": "medium",
        "total_questions": 2,
        "time_limit_minutes": 1
    })
}

fn questions_json() -> Value {
    json!([
        {
            "id": "q2",
            "question_text": "The trait that marks bitwise-copyable types",
            "question_type": "fill_blank",
            "correct_answer": "Copy",
            "points": 2,
            "order_index": 1
        },
        {
            "id": "q1",
            "question_text": "Which call borrows mutably?",
            "question_type": "multiple_choice",
            "options": ["v.len()", "v.push(1)", "v.iter()"],
            "correct_answer": 1,
            "order_index": 0
        }
    ])
}

async fn list_quizzes() -> Json<Value> {
    Json(json!({ "quizzes": [quiz_json("quiz-1"), quiz_json("locked")] }))
}

async fn get_quiz(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "quiz-1" | "locked" => {
            Json(json!({ "quiz": quiz_json(&id), "questions": questions_json() })).into_response()
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "Quiz not found" }))).into_response(),
    }
}

async fn submit_quiz(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if id == "locked" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Quiz already completed" })),
        )
            .into_response();
    }
    backend.submissions.lock().unwrap().push((headers, body.clone()));

    let answers = body["answers"].as_array().cloned().unwrap_or_default();
    let correct = answers
        .iter()
        .filter(|a| match a["question_id"].as_str() {
            Some("q1") => a["selected_answer_index"] == 1,
            Some("q2") => a["selected_answer_text"]
                .as_str()
                .map(|t| t.trim().eq_ignore_ascii_case("copy"))
                .unwrap_or(false),
            _ => false,
        })
        .count() as u64;
    Json(json!({
        "score": correct * 100 / 2,
        "correct_answers": correct,
        "total_questions": 2,
        "time_taken_seconds": body["total_time_seconds"]
    }))
    .into_response()
}

async fn spawn_server() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/quizzes", get(list_quizzes))
        .route("/api/quizzes/:id", get(get_quiz))
        .route("/api/quizzes/:id/submit", post(submit_quiz))
        .with_state(backend.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), backend)
}

fn client(base: &str) -> Arc<HttpQuizApi> {
    let config = ClientConfig::new(Url::parse(base).unwrap()).with_access_token("test-token");
    Arc::new(HttpQuizApi::new(config).unwrap())
}

#[tokio::test]
async fn list_load_answer_submit_flow() {
    let (base, backend) = spawn_server().await;
    let api = client(&base);

    let list = api.list_quizzes().await.unwrap();
    assert_eq!(list.quizzes.len(), 2);
    assert_eq!(list.quizzes[0].time_limit_seconds(), 60);

    let session = QuizSession::new(api.clone(), "quiz-1");
    let mut events = session.subscribe();
    session.load().await.unwrap();
    assert_eq!(session.current_question().await.unwrap().id, "q1");
    assert!(session.start().await);

    session.select_answer("q1", AnswerValue::Choice(0)).await.unwrap();
    session.select_answer("q1", AnswerValue::Choice(1)).await.unwrap();
    assert!(session.next().await);
    let q2 = session.current_question().await.unwrap();
    let value = AnswerValue::parse(q2.question_type, " Copy ").unwrap();
    session.select_answer(&q2.id, value).await.unwrap();

    let outcome = session.submit().await.unwrap();
    let SubmitOutcome::Completed(result) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(result.correct_answers, 2);
    assert_eq!(result.score, 100.0);

    let recorded = backend.submissions.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    let (headers, body) = &recorded[0];
    assert_eq!(headers["authorization"].to_str().unwrap(), "Bearer test-token");
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(body["answers"].as_array().unwrap().len(), 2);
    assert!(body["total_time_seconds"].as_u64().unwrap() < 60);

    let snap = session.snapshot().await;
    assert_eq!(snap.state, SessionState::Completed);
    assert!(!snap.timer_running);

    let mut saw_completed = false;
    while let Ok(ev) = events.try_recv() {
        if matches!(ev, SessionEvent::Completed(_)) {
            saw_completed = true;
        }
    }
    assert!(saw_completed);
}

#[tokio::test]
async fn unknown_quiz_is_not_found() {
    let (base, _) = spawn_server().await;
    let session = QuizSession::new(client(&base), "missing");
    let mut events = session.subscribe();

    let err = session.load().await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound { .. }));
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::NavigateToQuizList { .. }
    ));
}

#[tokio::test]
async fn rejected_submission_keeps_session_in_progress() {
    let (base, backend) = spawn_server().await;
    let session = QuizSession::new(client(&base), "locked");
    let mut events = session.subscribe();
    session.load().await.unwrap();
    session.start().await;
    session.select_answer("q1", AnswerValue::Choice(2)).await.unwrap();

    let err = session.submit().await.unwrap_err();
    match err {
        SessionError::Submit(ApiError::Status { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Quiz already completed");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(session.snapshot().await.state, SessionState::InProgress);
    assert!(backend.submissions.lock().unwrap().is_empty());

    let mut failure = None;
    while let Ok(ev) = events.try_recv() {
        if let SessionEvent::SubmitFailed { message } = ev {
            failure = Some(message);
        }
    }
    assert_eq!(failure.as_deref(), Some("Quiz already completed"));
    session.close().await;
    assert!(!session.snapshot().await.timer_running);
}
