use serde::{ Serialize, Deserialize };

/// Body of `POST /api/chat`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply of `POST /api/chat`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatReply {
    pub response: String,
}
