pub mod answers;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod navigator;
pub mod session;
pub mod timer;

use std::sync::Arc;

pub fn build_api() -> anyhow::Result<Arc<dyn api::QuizApi>> {
    let config = config::ClientConfig::from_env()?;
    tracing::debug!("quiz api at {}", config.base_url);
    let client: Arc<dyn api::QuizApi> = Arc::new(api::HttpQuizApi::new(config)?);
    Ok(client)
}
