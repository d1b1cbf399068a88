// File: crates/tailortalk_agent/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tailortalk_common::{logging::log_error, validation_error, TailorError};
use tracing::info;

use crate::agent::CalendarAgent;

#[derive(Clone)]
pub struct ChatState {
    pub agent: Arc<CalendarAgent>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Forwards a chat message to the agent.
///
/// Agent failures still answer 200 with the error text, so the chat UI
/// shows them in the conversation.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/chat",
    request_body(content = ChatRequest, example = json!({ "message": "Am I free tomorrow afternoon?" })),
    responses(
        (status = 200, description = "Agent reply", body = ChatResponse),
        (status = 400, description = "Empty message")
    ),
    tag = "Chat"
))]
pub async fn chat_handler(
    State(state): State<Arc<ChatState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, TailorError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(validation_error("message must not be empty"));
    }
    info!("Incoming chat message: {}", message);

    let response = match state.agent.run(message).await {
        Ok(response) => {
            info!("Agent response: {}", response);
            response
        }
        Err(e) => {
            log_error(&e, "Agent failed");
            format!("⚠️ Agent Error: {e}")
        }
    };
    Ok(Json(ChatResponse { response }))
}
