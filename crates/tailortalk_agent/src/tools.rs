// File: crates/tailortalk_agent/src/tools.rs
//! Tools the model can call, and the registry that dispatches them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tailortalk_gcal::logic::{
    book_event, check_availability, format_hhmm, get_free_slots, ScheduleSettings,
};
use tailortalk_gcal::normalize::{normalize_date_in_zone, normalize_in_zone, DateParseError};
use tailortalk_gcal::service::SharedCalendar;
use tracing::{info, warn};

pub const DEFAULT_MEETING_MINUTES: i64 = 30;

/// A tool that can be called by the LLM during a conversation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches function name in tool_call).
    fn name(&self) -> &str;
    /// Human-readable description for the LLM.
    fn description(&self) -> &str;
    /// JSON Schema for parameters.
    fn parameters(&self) -> Value;
    /// Runs the tool. Failures are reported in the returned text.
    async fn execute(&self, arguments: Value) -> String;

    /// Return OpenAI function-calling format definition.
    fn to_openai_definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three calendar tools sharing one calendar context.
    pub fn calendar_tools(context: CalendarContext) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CheckCalendarTool::new(context.clone())));
        registry.register(Box::new(BookMeetingTool::new(context.clone())));
        registry.register(Box::new(SuggestFreeSlotsTool::new(context)));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all tool definitions in OpenAI function-calling format.
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.to_openai_definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Executes a call by name with its raw JSON arguments.
    ///
    /// Unknown tools and unparseable arguments come back as text for the
    /// model to read.
    pub async fn execute(&self, name: &str, raw_arguments: &str) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            warn!("Model requested unknown tool '{}'", name);
            return format!("⚠️ Unknown tool '{name}'. Available tools: {}", self.names().join(", "));
        };

        let raw = if raw_arguments.trim().is_empty() { "{}" } else { raw_arguments };
        match serde_json::from_str::<Value>(raw) {
            Ok(arguments) => tool.execute(arguments).await,
            Err(e) => {
                warn!("Malformed arguments for '{}': {}", name, e);
                format!("⚠️ Invalid arguments for '{name}': {e}")
            }
        }
    }
}

pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Calendar handle, settings and clock shared by the calendar tools.
#[derive(Clone)]
pub struct CalendarContext {
    pub calendar: SharedCalendar,
    pub settings: Arc<ScheduleSettings>,
    clock: Clock,
}

impl CalendarContext {
    /// Uses the wall clock in the configured time zone.
    pub fn new(calendar: SharedCalendar, settings: Arc<ScheduleSettings>) -> Self {
        let zone_settings = settings.clone();
        Self {
            calendar,
            settings,
            clock: Arc::new(move || zone_settings.now_local()),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Local "now", the reference for relative dates.
    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}

fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("⚠️ Invalid arguments for '{tool}': {e}"))
}

fn date_advice(raw: &str, err: &DateParseError) -> String {
    format!("⚠️ Could not understand date '{raw}': {err}")
}

// --- check_calendar ---

#[derive(Deserialize)]
struct CheckCalendarArgs {
    date: String,
}

pub struct CheckCalendarTool {
    context: CalendarContext,
}

impl CheckCalendarTool {
    pub fn new(context: CalendarContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for CheckCalendarTool {
    fn name(&self) -> &str {
        "check_calendar"
    }

    fn description(&self) -> &str {
        "Check availability, returns busy slots for a given date."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": { "type": "string", "description": "The day to check, e.g. 'tomorrow', '6 July' or '2025-07-06'" }
            },
            "required": ["date"]
        })
    }

    async fn execute(&self, arguments: Value) -> String {
        let args: CheckCalendarArgs = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(advice) => return advice,
        };
        info!("Tool: check_calendar called with date='{}'", args.date);

        let zone = self.context.settings.time_zone;
        let date = match normalize_date_in_zone(&args.date, self.context.now(), zone) {
            Ok(date) => date,
            Err(e) => return date_advice(&args.date, &e),
        };

        let context = &self.context;
        match check_availability(context.calendar.as_ref(), &context.settings, date).await {
            Ok(busy) if busy.is_empty() => "✅ You're free all day.".to_string(),
            Ok(busy) => {
                let slots: Vec<String> = busy.iter().map(format_hhmm).collect();
                format!("⏰ You're busy during: {}", slots.join(", "))
            }
            Err(e) => format!("❌ Failed to check calendar: {e}"),
        }
    }
}

// --- book_meeting ---

#[derive(Deserialize)]
struct BookMeetingArgs {
    title: String,
    start: String,
    end: String,
}

pub struct BookMeetingTool {
    context: CalendarContext,
}

impl BookMeetingTool {
    pub fn new(context: CalendarContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for BookMeetingTool {
    fn name(&self) -> &str {
        "book_meeting"
    }

    fn description(&self) -> &str {
        "Book a meeting using title, start, and end time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "Meeting title" },
                "start": { "type": "string", "description": "Start as local time YYYY-MM-DDTHH:MM:SS or a phrase like 'tomorrow 3pm'" },
                "end": { "type": "string", "description": "End as local time YYYY-MM-DDTHH:MM:SS or a phrase like 'tomorrow 4pm'" }
            },
            "required": ["title", "start", "end"]
        })
    }

    async fn execute(&self, arguments: Value) -> String {
        let args: BookMeetingArgs = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(advice) => return advice,
        };
        info!(
            "Tool: book_meeting called with title='{}', start='{}', end='{}'",
            args.title, args.start, args.end
        );

        let now = self.context.now();
        let zone = self.context.settings.time_zone;
        let start = match normalize_in_zone(&args.start, now, zone) {
            Ok(start) => start,
            Err(e) => return date_advice(&args.start, &e),
        };
        let end = match normalize_in_zone(&args.end, now, zone) {
            Ok(end) => end,
            Err(e) => return date_advice(&args.end, &e),
        };

        let context = &self.context;
        match book_event(
            context.calendar.as_ref(),
            &context.settings,
            &args.title,
            None,
            start.as_naive(),
            end.as_naive(),
        )
        .await
        {
            Ok(result) => {
                let link = result.html_link.or(result.event_id).unwrap_or_default();
                format!("✅ Event booked successfully: {link}")
            }
            Err(e) => format!("❌ Failed to book event: {e}"),
        }
    }
}

// --- suggest_free_slots ---

#[derive(Deserialize)]
struct SuggestFreeSlotsArgs {
    date: String,
    #[serde(default = "default_duration")]
    duration: i64,
}

fn default_duration() -> i64 {
    DEFAULT_MEETING_MINUTES
}

pub struct SuggestFreeSlotsTool {
    context: CalendarContext,
}

impl SuggestFreeSlotsTool {
    pub fn new(context: CalendarContext) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Tool for SuggestFreeSlotsTool {
    fn name(&self) -> &str {
        "suggest_free_slots"
    }

    fn description(&self) -> &str {
        "Suggests free time slots for the given date and duration (in minutes)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": { "type": "string", "description": "The day to search, e.g. 'friday' or '2025-07-06'" },
                "duration": { "type": "integer", "description": "Meeting length in minutes", "default": DEFAULT_MEETING_MINUTES }
            },
            "required": ["date"]
        })
    }

    async fn execute(&self, arguments: Value) -> String {
        let args: SuggestFreeSlotsArgs = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(advice) => return advice,
        };
        info!(
            "Tool: suggest_free_slots called with date={}, duration={}",
            args.date, args.duration
        );

        let zone = self.context.settings.time_zone;
        let date = match normalize_date_in_zone(&args.date, self.context.now(), zone) {
            Ok(date) => date,
            Err(e) => return date_advice(&args.date, &e),
        };

        let context = &self.context;
        match get_free_slots(context.calendar.as_ref(), &context.settings, date, args.duration).await {
            Ok(slots) if slots.is_empty() => "❌ No free slots available for that duration.".to_string(),
            Ok(slots) => {
                let slots: Vec<String> = slots.iter().map(format_hhmm).collect();
                format!("✅ You're free at: {}", slots.join(", "))
            }
            Err(e) => format!("❌ Failed to find free slots: {e}"),
        }
    }
}
