// --- File: crates/tailortalk_agent/src/routes.rs ---

use std::sync::Arc;

use axum::{routing::post, Router};

use crate::agent::CalendarAgent;
use crate::handlers::{chat_handler, ChatState};

/// Creates a router with the chat endpoint.
pub fn routes(agent: Arc<CalendarAgent>) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .with_state(Arc::new(ChatState { agent }))
}
