use quiz_client::api::QuizApi;
use quiz_client::build_api;
use quiz_client::models::{AnswerValue, Question, QuestionType};
use quiz_client::session::{QuizSession, SessionEvent, SubmitOutcome};
use quiz_client::timer::format_clock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

const HELP: &str = "commands: start | next | prev | show | answer <value> | submit | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let api = build_api()?;

    let Some(quiz_id) = std::env::args().nth(1) else {
        return print_quiz_list(api.as_ref()).await;
    };

    let session = QuizSession::new(api.clone(), quiz_id);
    let mut events = session.subscribe();
    if session.load().await.is_err() {
        return print_quiz_list(api.as_ref()).await;
    }

    if let Some(quiz) = session.quiz().await {
        println!("{}", quiz.title);
        if let Some(desc) = &quiz.description {
            println!("{}", desc);
        }
        println!(
            "{} questions, {} minutes, {:?} difficulty",
            quiz.total_questions, quiz.time_limit_minutes, quiz.difficulty
        );
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break; };
                if !handle_command(&session, line.trim()).await {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if print_event(&event) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("event printer lagged by {}", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.close().await;
    Ok(())
}

async fn print_quiz_list(api: &dyn QuizApi) -> anyhow::Result<()> {
    let list = api.list_quizzes().await?;
    if list.quizzes.is_empty() {
        println!("no quizzes available");
    }
    for quiz in list.quizzes {
        let status = match (quiz.completed_at, quiz.score) {
            (Some(at), Some(score)) => format!("completed {} ({score}%)", at.format("%Y-%m-%d")),
            (Some(at), None) => format!("completed {}", at.format("%Y-%m-%d")),
            _ => "open".to_string(),
        };
        println!(
            "{}  {}  [{:?}/{:?}, {} min]  {}",
            quiz.id, quiz.title, quiz.quiz_type, quiz.difficulty, quiz.time_limit_minutes, status
        );
    }
    Ok(())
}

/// Returns `false` when the user wants to leave.
async fn handle_command(session: &QuizSession, line: &str) -> bool {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    match cmd {
        "" => {}
        "start" => {
            if session.start().await {
                show_current(session).await;
            } else {
                println!("quiz already started");
            }
        }
        "next" | "n" => {
            session.next().await;
            show_current(session).await;
        }
        "prev" | "p" => {
            session.previous().await;
            show_current(session).await;
        }
        "show" => show_current(session).await,
        "answer" | "a" => {
            let Some(question) = session.current_question().await else {
                return true;
            };
            let Some(value) = AnswerValue::parse(question.question_type, rest) else {
                println!("cannot read {:?} as an answer to this question", rest);
                return true;
            };
            match session.select_answer(&question.id, value).await {
                Ok(true) => println!("saved"),
                Ok(false) => println!("quiz is not in progress"),
                Err(err) => println!("{}", err),
            }
        }
        // Both the result and the failure reason arrive as events.
        "submit" => {
            if let Ok(SubmitOutcome::Ignored) = session.submit().await {
                println!("nothing to submit right now");
            }
        }
        "quit" | "q" => return false,
        _ => println!("{}", HELP),
    }
    true
}

async fn show_current(session: &QuizSession) {
    let snap = session.snapshot().await;
    let Some(question) = session.current_question().await else {
        return;
    };
    let answer = session.answer_for(&question.id).await;
    println!(
        "\n[{}/{}] {} left, {} answered",
        snap.current_index + 1,
        snap.question_count,
        format_clock(snap.remaining_seconds),
        snap.answered
    );
    print_question(&question);
    if let Some(answer) = answer {
        match (answer.selected_answer_index, answer.selected_answer_text) {
            (Some(idx), _) => println!("your answer: {}", idx),
            (None, Some(text)) => println!("your answer: {}", text),
            _ => {}
        }
    }
}

fn print_question(question: &Question) {
    println!("{} ({} pt)", question.question_text, question.points);
    match question.question_type {
        QuestionType::MultipleChoice => {
            for (idx, option) in question.options.iter().flatten().enumerate() {
                println!("  {}) {}", idx, option);
            }
        }
        QuestionType::TrueFalse => println!("  true / false"),
        QuestionType::FillBlank => println!("  type your answer"),
    }
}

/// Returns `true` once the session is over.
fn print_event(event: &SessionEvent) -> bool {
    match event {
        SessionEvent::Tick { remaining_seconds } => {
            if *remaining_seconds > 0 && (*remaining_seconds % 60 == 0 || *remaining_seconds <= 10) {
                println!("{} left", format_clock(*remaining_seconds));
            }
        }
        SessionEvent::Expired => println!("time is up, submitting"),
        SessionEvent::Submitting { answer_count, .. } => {
            println!("submitting {} answers...", answer_count)
        }
        SessionEvent::SubmitFailed { message } => println!("!! submission failed: {}", message),
        SessionEvent::Completed(result) => {
            println!(
                "score {}% ({}/{} correct) in {}",
                result.score,
                result.correct_answers,
                result.total_questions,
                format_clock(result.time_taken_seconds)
            );
            return true;
        }
        SessionEvent::NavigateToQuizList { .. } | SessionEvent::Closed => return true,
        SessionEvent::Loaded { .. } | SessionEvent::Started { .. } => {}
    }
    false
}
