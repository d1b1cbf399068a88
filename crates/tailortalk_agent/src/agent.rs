// File: crates/tailortalk_agent/src/agent.rs
use std::sync::Arc;

use chrono::NaiveDateTime;
use tailortalk_config::LlmConfig;
use thiserror::Error;
use tracing::{debug, info};

use crate::llm::{ChatMessage, ChatModel, ModelReply, OpenAiCompatibleModel};
use crate::tools::{CalendarContext, ToolRegistry};

pub const DEFAULT_MAX_ITERATIONS: usize = 6;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("LLM API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("LLM returned no choices")]
    EmptyResponse,
    #[error("No answer after {0} steps")]
    IterationLimit(usize),
}

/// Runs one user message through the model, executing tool calls until it answers.
pub struct CalendarAgent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    context: CalendarContext,
    max_iterations: usize,
}

impl CalendarAgent {
    pub fn new(model: Arc<dyn ChatModel>, context: CalendarContext) -> Self {
        Self {
            model,
            tools: ToolRegistry::calendar_tools(context.clone()),
            context,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Agent backed by the configured OpenAI-compatible endpoint.
    pub fn from_config(config: &LlmConfig, context: CalendarContext) -> Self {
        let model = Arc::new(OpenAiCompatibleModel::from_config(config));
        Self::new(model, context)
            .with_max_iterations(config.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS))
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub(crate) fn system_prompt(&self, now: NaiveDateTime) -> String {
        let tz = self.context.settings.time_zone;
        format!(
            "You are TailorTalk, an assistant that manages the user's Google Calendar.\n\
             Current local date and time: {now} ({weekday}), time zone {tz}.\n\
             Tools:\n\
             - check_calendar(date): busy times on a day\n\
             - suggest_free_slots(date, duration): free slots of at least `duration` minutes\n\
             - book_meeting(title, start, end): create an event\n\
             Rules:\n\
             - Pass dates and times as the user wrote them (\"tomorrow\", \"6 July\", \"friday 3pm\") \
             or as local times in the form YYYY-MM-DDTHH:MM:SS. The tools resolve relative phrases.\n\
             - Do not book until you know the title, start and end. If only a start is given, \
             assume the meeting lasts 30 minutes.\n\
             - Relay tool results faithfully and keep answers short.",
            now = now.format("%Y-%m-%dT%H:%M:%S"),
            weekday = now.format("%A"),
            tz = tz.name(),
        )
    }

    pub async fn run(&self, message: &str) -> Result<String, AgentError> {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt(self.context.now())),
            ChatMessage::user(message),
        ];
        let definitions = self.tools.definitions();

        for step in 1..=self.max_iterations {
            match self.model.complete(&messages, &definitions).await? {
                ModelReply::Text(text) => {
                    debug!("Agent answered after {} step(s)", step);
                    return Ok(text);
                }
                ModelReply::ToolCalls { content, calls } => {
                    messages.push(ChatMessage::Assistant {
                        content,
                        tool_calls: calls.clone(),
                    });
                    for call in calls {
                        info!("Tool call {}({})", call.function.name, call.function.arguments);
                        let output = self
                            .tools
                            .execute(&call.function.name, &call.function.arguments)
                            .await;
                        info!("Tool {} returned: {}", call.function.name, output);
                        messages.push(ChatMessage::Tool {
                            tool_call_id: call.id,
                            name: call.function.name,
                            content: output,
                        });
                    }
                }
            }
        }

        Err(AgentError::IterationLimit(self.max_iterations))
    }
}
