use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION}};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use super::{ChatClient, ChatTurn, CompletionResponse};
use crate::llm::{LlmConfig, LlmError};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAIChatClient {
    http: HttpClient,
    api_key_env: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

// Every level is optional: an error payload or a truncated body still
// deserializes and simply yields no content.
#[derive(Deserialize, Default)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIResponse {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
    }
}

impl OpenAIChatClient {
    pub fn new(
        api_key_env: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_key_env,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(
            config.api_key_env.clone(),
            config.completion_model.clone(),
            config.base_url.clone(),
            config.timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn bearer(&self) -> Result<HeaderValue, LlmError> {
        let api_key = env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(self.api_key_env.clone()))?;
        HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| LlmError::InvalidApiKey(e.to_string()))
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(&self, turns: &[ChatTurn]) -> Result<CompletionResponse, LlmError> {
        let auth = self.bearer()?;
        let req = OpenAIChatRequest {
            model: &self.model,
            messages: turns,
        };

        debug!("POST {} with {} turns", self.endpoint(), turns.len());
        let resp = self.http.post(self.endpoint())
            .header(AUTHORIZATION, auth)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;

        // A body that is not the expected shape counts as "no content".
        let bytes = resp.bytes().await?;
        let parsed = serde_json::from_slice::<OpenAIResponse>(&bytes).unwrap_or_default();

        Ok(CompletionResponse { response: parsed.into_content() })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}
