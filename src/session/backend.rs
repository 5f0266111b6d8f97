use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use std::time::Duration;
use thiserror::Error;

use crate::models::api::{ ChatReply, ChatRequest };
use crate::persona::PersonaProxy;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("persona proxy request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where the conversation controller sends its messages.
#[async_trait]
pub trait PersonaBackend: Send + Sync {
    async fn ask(&self, message: &str) -> Result<String, BackendError>;
}

#[async_trait]
impl PersonaBackend for PersonaProxy {
    async fn ask(&self, message: &str) -> Result<String, BackendError> {
        Ok(self.reply(message).await)
    }
}

/// Talks to a running `kinbot serve` over `POST /api/chat`.
pub struct HttpPersonaBackend {
    http: HttpClient,
    endpoint: String,
}

impl HttpPersonaBackend {
    pub fn new(proxy_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/chat", proxy_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PersonaBackend for HttpPersonaBackend {
    async fn ask(&self, message: &str) -> Result<String, BackendError> {
        debug!("POST {}", self.endpoint);
        let reply = self.http.post(&self.endpoint)
            .json(&ChatRequest { message: message.to_string() })
            .send()
            .await?
            .error_for_status()?
            .json::<ChatReply>()
            .await?;
        Ok(reply.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let backend = HttpPersonaBackend::new("http://127.0.0.1:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.endpoint(), "http://127.0.0.1:3000/api/chat");
    }
}
