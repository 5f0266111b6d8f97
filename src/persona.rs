use crate::config::prompt::PromptConfig;
use crate::llm::chat::{ ChatClient, ChatTurn };

use log::{ debug, info, warn };
use std::sync::Arc;

/// Server-side relay between the chat front-end and the model provider.
///
/// Stateless: every call sends the persona instruction and the one message
/// it was given, nothing else. Never fails; any provider problem turns into
/// the configured fallback reply.
#[derive(Clone)]
pub struct PersonaProxy {
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
}

impl PersonaProxy {
    pub fn new(chat_client: Arc<dyn ChatClient>, prompt_config: Arc<PromptConfig>) -> Self {
        info!(
            "Persona proxy configured: Prompts={}, Model={}, BaseURL={}",
            prompt_config.version,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );
        Self { chat_client, prompt_config }
    }

    pub fn prompts(&self) -> &PromptConfig {
        &self.prompt_config
    }

    pub fn build_turns(&self, message: &str) -> [ChatTurn; 2] {
        [
            ChatTurn::system(self.prompt_config.persona_instruction.as_str()),
            ChatTurn::user(message),
        ]
    }

    pub async fn reply(&self, message: &str) -> String {
        let turns = self.build_turns(message);
        debug!("Relaying message of {} chars", message.chars().count());

        match self.chat_client.complete(&turns).await {
            Ok(completion) => match completion.response {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    warn!("Provider returned no usable content, answering with fallback");
                    self.prompt_config.fallback_reply.clone()
                }
            },
            Err(e) => {
                warn!("Provider call failed, answering with fallback: {}", e);
                self.prompt_config.fallback_reply.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::{ FALLBACK_REPLY, PERSONA_INSTRUCTION };
    use crate::llm::chat::{ ChatRole, CompletionResponse };
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum Script {
        Reply(&'static str),
        NoContent,
        Fail,
    }

    struct RecordingClient {
        script: Script,
        calls: Mutex<Vec<Vec<ChatTurn>>>,
    }

    impl RecordingClient {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self { script, calls: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn complete(&self, turns: &[ChatTurn]) -> Result<CompletionResponse, LlmError> {
            self.calls.lock().unwrap().push(turns.to_vec());
            match self.script {
                Script::Reply(text) => Ok(CompletionResponse { response: Some(text.to_string()) }),
                Script::NoContent => Ok(CompletionResponse { response: None }),
                Script::Fail => Err(LlmError::MissingApiKey("OPENAI_API_KEY".to_string())),
            }
        }

        fn get_model(&self) -> String {
            "stub".to_string()
        }

        fn get_base_url(&self) -> Option<String> {
            None
        }
    }

    fn proxy(client: Arc<RecordingClient>) -> PersonaProxy {
        PersonaProxy::new(client, Arc::new(PromptConfig::default()))
    }

    #[tokio::test]
    async fn sends_system_then_user_only() {
        let client = RecordingClient::new(Script::Reply("Hace tres semanas."));
        let proxy = proxy(client.clone());

        let reply = proxy.reply("¿Desde cuándo tiene el dolor?").await;
        assert_eq!(reply, "Hace tres semanas.");

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0].role, ChatRole::System);
        assert_eq!(calls[0][0].content, PERSONA_INSTRUCTION);
        assert_eq!(calls[0][1].role, ChatRole::User);
        assert_eq!(calls[0][1].content, "¿Desde cuándo tiene el dolor?");
    }

    #[tokio::test]
    async fn request_size_does_not_grow_across_turns() {
        let client = RecordingClient::new(Script::Reply("Sí."));
        let proxy = proxy(client.clone());

        for question in ["¿Le duele al caminar?", "¿Y al subir escaleras?", "¿Duerme bien?"] {
            proxy.reply(question).await;
        }

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|turns| turns.len() == 2));
        assert_eq!(calls[2][1].content, "¿Duerme bien?");
    }

    #[tokio::test]
    async fn missing_content_yields_fallback() {
        let reply = proxy(RecordingClient::new(Script::NoContent)).reply("hola").await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn blank_content_yields_fallback() {
        let reply = proxy(RecordingClient::new(Script::Reply("   "))).reply("hola").await;
        assert_eq!(reply, "No entendí tu pregunta.");
    }

    #[tokio::test]
    async fn provider_failure_yields_fallback() {
        let reply = proxy(RecordingClient::new(Script::Fail)).reply("hola").await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn custom_fallback_is_used() {
        let prompts = PromptConfig { fallback_reply: "¿Cómo dice?".to_string(), ..PromptConfig::default() };
        let proxy = PersonaProxy::new(RecordingClient::new(Script::NoContent), Arc::new(prompts));
        assert_eq!(proxy.reply("hola").await, "¿Cómo dice?");
    }
}
