use crate::models::api::{ ChatReply, ChatRequest };
use crate::persona::PersonaProxy;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    body::Bytes,
    routing::{ get, post },
    Router,
    extract::State,
    response::{ IntoResponse, Response },
    http::StatusCode,
    Json,
};
use tower_http::cors::{Any, CorsLayer};
use log::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<PersonaProxy>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    proxy: Arc<PersonaProxy>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = build_router(AppState { proxy });

    let listener = tokio::net::TcpListener::bind(addr).await
        .map_err(|e| format!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e))?;
    info!("Persona proxy listening on: http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

// The body is parsed by hand so that clients posting JSON without a
// content-type header are still accepted.
async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let req: ChatRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!("Rejected malformed chat request: {}", e);
            return (StatusCode::BAD_REQUEST, format!("invalid request body: {}", e)).into_response();
        }
    };

    let response = state.proxy.reply(&req.message).await;
    (StatusCode::OK, Json(ChatReply { response })).into_response()
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
