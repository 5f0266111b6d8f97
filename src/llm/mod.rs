pub mod chat;

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Name of the environment variable holding the bearer credential.
    /// Read on every request, never cached.
    pub api_key_env: String,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            completion_model: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key variable '{0}' is not set")]
    MissingApiKey(String),
    #[error("invalid API key format: {0}")]
    InvalidApiKey(String),
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}
