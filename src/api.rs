use crate::config::ClientConfig;
use crate::error::{server_message, ApiError};
use crate::models::{QuizEnvelope, QuizList, QuizResult, Submission};
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// The grading backend as seen by a quiz session.
pub trait QuizApi: Send + Sync {
    fn list_quizzes(&self) -> BoxFuture<'static, Result<QuizList, ApiError>>;

    fn fetch_quiz(&self, quiz_id: &str) -> BoxFuture<'static, Result<QuizEnvelope, ApiError>>;

    fn submit_quiz(
        &self,
        quiz_id: &str,
        submission: &Submission,
    ) -> BoxFuture<'static, Result<QuizResult, ApiError>>;
}

#[derive(Clone)]
pub struct HttpQuizApi {
    client: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpQuizApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url,
            access_token: config.access_token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let request_id = uuid::Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        if let Some(token) = &self.access_token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(err) => warn!("access token is not a valid header value: {}", err),
            }
        }
        headers
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let fallback = status.canonical_reason().unwrap_or("request failed");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: server_message(&body, fallback),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

impl QuizApi for HttpQuizApi {
    fn list_quizzes(&self) -> BoxFuture<'static, Result<QuizList, ApiError>> {
        let client = self.client.clone();
        let url = self.endpoint(&["api", "quizzes"]);
        let headers = self.headers();
        Box::pin(async move {
            let url = url?;
            debug!("GET {}", url);
            let resp = client.get(url).headers(headers).send().await?;
            read_json(resp).await
        })
    }

    fn fetch_quiz(&self, quiz_id: &str) -> BoxFuture<'static, Result<QuizEnvelope, ApiError>> {
        let client = self.client.clone();
        let url = self.endpoint(&["api", "quizzes", quiz_id]);
        let headers = self.headers();
        Box::pin(async move {
            let url = url?;
            debug!("GET {}", url);
            let resp = client.get(url).headers(headers).send().await?;
            read_json(resp).await
        })
    }

    fn submit_quiz(
        &self,
        quiz_id: &str,
        submission: &Submission,
    ) -> BoxFuture<'static, Result<QuizResult, ApiError>> {
        let client = self.client.clone();
        let url = self.endpoint(&["api", "quizzes", quiz_id, "submit"]);
        let headers = self.headers();
        let body = submission.clone();
        Box::pin(async move {
            let url = url?;
            debug!("POST {} with {} answers", url, body.answers.len());
            let resp = client.post(url).headers(headers).json(&body).send().await?;
            read_json(resp).await
        })
    }
}
