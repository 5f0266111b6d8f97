//! HTTP tests for the persona proxy endpoint, against a mock provider.

mod common;

use axum::{
    body::Body,
    http::{ Request, StatusCode },
};
use common::*;
use kinbot::config::prompt::{ FALLBACK_REPLY, PERSONA_INSTRUCTION };
use kinbot::models::api::ChatReply;
use kinbot::server::api::{ build_router, AppState };
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

async fn post_chat(state: AppState, body: &str, json_header: bool) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method("POST").uri("/api/chat");
    if json_header {
        request = request.header("content-type", "application/json");
    }
    let response = build_router(state)
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn relays_message_with_persona_instruction() {
    let (addr, provider) =
        start_mock_provider(completion("Hace tres semanas, después de cargar unas cajas.")).await;
    let state = AppState { proxy: Arc::new(proxy_for(addr)) };

    let (status, body) = post_chat(state, r#"{"message":"¿Desde cuándo tiene el dolor?"}"#, true).await;

    assert_eq!(status, StatusCode::OK);
    let reply: ChatReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.response, "Hace tres semanas, después de cargar unas cajas.");

    assert_eq!(provider.request_count(), 1);
    assert_eq!(
        provider.request(0)["messages"],
        json!([
            { "role": "system", "content": PERSONA_INSTRUCTION },
            { "role": "user", "content": "¿Desde cuándo tiene el dolor?" }
        ])
    );
}

#[tokio::test]
async fn accepts_body_without_content_type() {
    let (addr, _) = start_mock_provider(completion("Sí, al agacharme.")).await;
    let state = AppState { proxy: Arc::new(proxy_for(addr)) };

    let (status, body) = post_chat(state, r#"{"message":"¿Le duele al agacharse?"}"#, false).await;

    assert_eq!(status, StatusCode::OK);
    let reply: ChatReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.response, "Sí, al agacharme.");
}

#[tokio::test]
async fn provider_without_content_gives_fallback() {
    let (addr, _) = start_mock_provider(json!({ "id": "cmpl-1", "choices": [] })).await;
    let state = AppState { proxy: Arc::new(proxy_for(addr)) };

    let (status, body) = post_chat(state, r#"{"message":"hola"}"#, true).await;

    assert_eq!(status, StatusCode::OK);
    let reply: ChatReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.response, "No entendí tu pregunta.");
}

#[tokio::test]
async fn missing_credential_gives_fallback_without_upstream_call() {
    let (addr, provider) = start_mock_provider(completion("no debería llegar")).await;
    let unset = format!("KINBOT_IT_UNSET_{}", uuid::Uuid::new_v4().simple());
    let state = AppState { proxy: Arc::new(proxy_with_key_env(addr, unset)) };

    let (status, body) = post_chat(state, r#"{"message":"hola"}"#, true).await;

    assert_eq!(status, StatusCode::OK);
    let reply: ChatReply = serde_json::from_slice(&body).unwrap();
    assert_eq!(reply.response, FALLBACK_REPLY);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (addr, provider) = start_mock_provider(completion("x")).await;
    let state = AppState { proxy: Arc::new(proxy_for(addr)) };

    let (status, _) = post_chat(state, "{not json", true).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn health_is_ok() {
    let (addr, _) = start_mock_provider(completion("x")).await;
    let state = AppState { proxy: Arc::new(proxy_for(addr)) };

    let response = build_router(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
