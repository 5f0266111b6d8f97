#![allow(dead_code)]

use axum::{
    extract::State,
    response::IntoResponse,
    routing::post,
    Json,
    Router,
};
use kinbot::config::prompt::PromptConfig;
use kinbot::llm::chat::new_client;
use kinbot::llm::LlmConfig;
use kinbot::persona::PersonaProxy;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{ Arc, Mutex };
use std::time::Duration;

/// Mock provider: answers every completion with `reply` and records bodies.
#[derive(Clone)]
pub struct MockProvider {
    pub reply: Value,
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl MockProvider {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, i: usize) -> Value {
        self.requests.lock().unwrap()[i].clone()
    }
}

async fn mock_completion(
    State(provider): State<MockProvider>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    provider.requests.lock().unwrap().push(body);
    Json(provider.reply.clone())
}

pub async fn serve_router(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn start_mock_provider(reply: Value) -> (SocketAddr, MockProvider) {
    let provider = MockProvider { reply, requests: Arc::new(Mutex::new(Vec::new())) };
    let app = Router::new()
        .route("/v1/chat/completions", post(mock_completion))
        .with_state(provider.clone());
    (serve_router(app).await, provider)
}

pub fn completion(content: &str) -> Value {
    serde_json::json!({
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

/// Proxy wired to the mock provider with a freshly set, test-unique key variable.
pub fn proxy_for(provider_addr: SocketAddr) -> PersonaProxy {
    let key_env = format!("KINBOT_IT_KEY_{}", uuid::Uuid::new_v4().simple());
    std::env::set_var(&key_env, "sk-integration");
    proxy_with_key_env(provider_addr, key_env)
}

pub fn proxy_with_key_env(provider_addr: SocketAddr, key_env: String) -> PersonaProxy {
    let config = LlmConfig {
        api_key_env: key_env,
        completion_model: None,
        base_url: Some(format!("http://{}", provider_addr)),
        timeout: Duration::from_secs(5),
    };
    PersonaProxy::new(new_client(&config).unwrap(), Arc::new(PromptConfig::default()))
}
