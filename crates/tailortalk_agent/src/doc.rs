// File: crates/tailortalk_agent/src/doc.rs
#![cfg(feature = "openapi")]

use utoipa::OpenApi;

use crate::handlers::{ChatRequest, ChatResponse};

#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::chat_handler),
    components(schemas(ChatRequest, ChatResponse)),
    tags(
        (name = "Chat", description = "Conversational calendar assistant")
    ),
    servers(
        (url = "/api", description = "TailorTalk API server")
    )
)]
pub struct ChatApiDoc;
