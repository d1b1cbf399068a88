// File: crates/tailortalk_agent/src/llm.rs
//! Chat completion client for OpenAI-compatible endpoints (Mistral by default).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tailortalk_common::{create_client, HTTP_CLIENT};
use tailortalk_config::LlmConfig;
use tracing::debug;

use crate::agent::AgentError;

/// One entry of the conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments
    #[serde(deserialize_with = "arguments_as_string")]
    pub arguments: String,
}

fn no_tools(tools: &&[Value]) -> bool {
    tools.is_empty()
}

fn function_type() -> String {
    "function".to_string()
}

// Some providers send arguments as an object instead of a JSON string
fn arguments_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    })
}

/// What the model wants next.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// A final answer for the user.
    Text(String),
    /// Tools to run before answering.
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One completion over the full history, offering `tools` in function-calling format.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ModelReply, AgentError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl From<ResponseMessage> for ModelReply {
    fn from(message: ResponseMessage) -> Self {
        match message.tool_calls {
            Some(calls) if !calls.is_empty() => ModelReply::ToolCalls {
                content: message.content.filter(|c| !c.is_empty()),
                calls,
            },
            _ => ModelReply::Text(message.content.unwrap_or_default()),
        }
    }
}

/// `POST {api_base}/chat/completions` with bearer auth.
pub struct OpenAiCompatibleModel {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatibleModel {
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = match config.timeout_secs {
            Some(secs) => create_client(secs).unwrap_or_else(|err| {
                tracing::warn!("Using shared HTTP client, custom timeout failed: {}", err);
                HTTP_CLIENT.clone()
            }),
            None => HTTP_CLIENT.clone(),
        };
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ModelReply, AgentError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            tools,
            tool_choice: (!tools.is_empty()).then_some("auto"),
        };
        debug!(
            "Calling {} with {} messages and {} tools",
            self.model,
            messages.len(),
            tools.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| ModelReply::from(choice.message))
            .ok_or(AgentError::EmptyResponse)
    }
}
