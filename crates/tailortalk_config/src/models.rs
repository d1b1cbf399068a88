// --- File: crates/tailortalk_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser (the chat UI).
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8501".to_string()]
}

// --- Google Calendar Config ---
// Credentials are usually injected via `secret_from_env`:
// GCAL_CREDENTIALS_BASE64 holds the base64-encoded service account JSON.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GcalConfig {
    pub calendar_id: Option<String>,
    pub key_path: Option<String>,
    pub credentials_base64: Option<String>,
    /// IANA zone used for day boundaries and new events, e.g. "Asia/Kolkata".
    pub time_zone: Option<String>,
    /// "HH:MM", defaults to 09:00
    pub work_start_time: Option<String>,
    /// "HH:MM", defaults to 18:00
    pub work_end_time: Option<String>,
    pub default_slot_minutes: Option<i64>,
}

// --- LLM Config ---
// Any OpenAI-compatible chat completions endpoint. API key loaded via LLM_API_KEY.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    pub max_iterations: Option<usize>,
    pub timeout_secs: Option<u64>,
}

fn default_api_base() -> String {
    "https://api.mistral.ai/v1".to_string()
}

fn default_model() -> String {
    "mistral-medium".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Default level for the tailortalk crates, e.g. "info" or "debug".
    pub level: Option<String>,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}
