use crate::error::ConfigError;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub access_token: Option<String>,
    /// `None` keeps the runtime default (no client-side timeout).
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            access_token: None,
            request_timeout: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_base = std::env::var("QUIZ_API_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(raw_base.trim()).map_err(|e| ConfigError::Invalid {
            key: "QUIZ_API_BASE_URL",
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                key: "QUIZ_API_BASE_URL",
                reason: "must be an absolute http(s) url".into(),
            });
        }

        let access_token = std::env::var("QUIZ_API_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let request_timeout = match std::env::var("QUIZ_API_TIMEOUT_SECS") {
            Ok(v) if !v.trim().is_empty() => {
                let secs = v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                    key: "QUIZ_API_TIMEOUT_SECS",
                    reason: e.to_string(),
                })?;
                Some(Duration::from_secs(secs))
            }
            _ => None,
        };

        Ok(Self {
            base_url,
            access_token,
            request_timeout,
        })
    }
}
