// File: services/tailortalk_backend/src/main.rs
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tailortalk_agent::{CalendarAgent, CalendarContext};
use tailortalk_backend::{build_app, DEFAULT_STATIC_DIR};
use tailortalk_common::logging;
use tailortalk_config::load_config;
use tailortalk_gcal::routes::build_state;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() {
    let config = load_config().expect("Failed to load config");
    let _log_guard = logging::init_with_config(&config.logging.clone().unwrap_or_default());

    let gcal_state = build_state(&config)
        .await
        .expect("Failed to initialize Google Calendar");
    let llm_config = config
        .llm
        .as_ref()
        .expect("Missing [llm] section in configuration");

    let context = CalendarContext::new(gcal_state.calendar.clone(), gcal_state.settings.clone());
    let agent = Arc::new(CalendarAgent::from_config(llm_config, context));
    info!(
        "Agent ready with model {} and tools {:?}",
        llm_config.model,
        agent.tools().names()
    );

    let static_dir = env::var("STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR));
    let app = build_app(gcal_state, agent, &config.server.allowed_origins, &static_dir);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));
    info!("Starting server at http://{}", addr);
    info!("Chat endpoint available at http://{}/api/chat", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}
