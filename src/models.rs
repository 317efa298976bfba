use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuizType {
    Lesson,
    Weekly,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    FillBlank,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "type")]
    pub quiz_type: QuizType,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub total_questions: u32,
    pub time_limit_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Quiz {
    pub fn time_limit_seconds(&self) -> u32 {
        self.time_limit_minutes.saturating_mul(60)
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(alias = "text")]
    pub question_text: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Opaque to the client; grading happens on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<serde_json::Value>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub order_index: u32,
}

fn default_points() -> u32 {
    1
}

/// What the user picked for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    /// Zero-based option index (multiple_choice).
    Choice(usize),
    /// true_false; carried on the wire as the literal `"true"` / `"false"`.
    TrueFalse(bool),
    /// fill_blank free text.
    Text(String),
}

impl AnswerValue {
    /// Interprets raw user input for the given question type.
    pub fn parse(question_type: QuestionType, raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match question_type {
            QuestionType::MultipleChoice => raw.parse::<usize>().ok().map(AnswerValue::Choice),
            QuestionType::TrueFalse => match raw.to_lowercase().as_str() {
                "true" | "t" => Some(AnswerValue::TrueFalse(true)),
                "false" | "f" => Some(AnswerValue::TrueFalse(false)),
                _ => None,
            },
            QuestionType::FillBlank => {
                if raw.is_empty() {
                    None
                } else {
                    Some(AnswerValue::Text(raw.to_string()))
                }
            }
        }
    }

    pub fn fits(&self, question: &Question) -> Result<(), String> {
        match (question.question_type, self) {
            (QuestionType::MultipleChoice, AnswerValue::Choice(idx)) => {
                let count = question.options.as_ref().map(Vec::len).unwrap_or(0);
                if *idx < count {
                    Ok(())
                } else {
                    Err(format!("option index {idx} out of range (0..{count})"))
                }
            }
            (QuestionType::TrueFalse, AnswerValue::TrueFalse(_)) => Ok(()),
            (QuestionType::FillBlank, AnswerValue::Text(_)) => Ok(()),
            _ => Err("must match question type".into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Answer {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_answer_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<u32>,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, value: AnswerValue) -> Self {
        let (selected_answer_index, selected_answer_text) = match value {
            AnswerValue::Choice(idx) => (Some(idx), None),
            AnswerValue::TrueFalse(flag) => (None, Some(flag.to_string())),
            AnswerValue::Text(text) => (None, Some(text)),
        };
        Self {
            question_id: question_id.into(),
            selected_answer_index,
            selected_answer_text,
            time_spent_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizResult {
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub time_taken_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Submission {
    pub answers: Vec<Answer>,
    pub total_time_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizEnvelope {
    pub quiz: Quiz,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizList {
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}
