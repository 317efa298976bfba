use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("cannot decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("quiz {quiz_id} not found")]
    NotFound { quiz_id: String },

    #[error("failed to load quiz: {0}")]
    Load(#[source] ApiError),

    #[error("failed to submit quiz: {0}")]
    Submit(#[source] ApiError),

    #[error("invalid answer for {question_id}: {reason}")]
    InvalidAnswer { question_id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Deserialize)]
struct NestedPayload {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Nested(NestedPayload),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorField>,
    #[serde(default)]
    message: Option<String>,
}

/// Pulls the server-provided reason out of a non-OK response body.
pub fn server_message(body: &str, fallback: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let found = match parsed.error {
            Some(ErrorField::Text(text)) => Some(text),
            Some(ErrorField::Nested(nested)) => Some(nested.message),
            None => parsed.message,
        };
        if let Some(msg) = found.filter(|m| !m.trim().is_empty()) {
            return msg;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
