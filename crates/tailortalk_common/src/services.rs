//! Service abstractions for external services.
//!
//! The calendar provider sits behind [`CalendarService`] so the slot logic,
//! HTTP handlers and agent tools can run against an in-memory implementation
//! in tests.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::models::TimeInterval;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A trait for calendar service operations.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Busy intervals of timed events between `day_start` and `day_end`,
    /// sorted by start time.
    fn list_busy_intervals(
        &self,
        calendar_id: &str,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<TimeInterval<DateTime<Utc>>>, Self::Error>;

    /// Insert a calendar event.
    fn insert_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error>;
}

/// A new event, expressed in local wall-clock time of `time_zone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// The summary or title of the event.
    pub summary: String,
    /// An optional description of the event.
    pub description: Option<String>,
    /// Local start, no offset.
    pub start: NaiveDateTime,
    /// Local end, no offset.
    pub end: NaiveDateTime,
    /// IANA zone the local times are in, e.g. "Asia/Kolkata".
    pub time_zone: String,
}

/// Represents the result of a calendar event operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventResult {
    /// The ID of the event.
    pub event_id: Option<String>,
    /// Link to the event in the calendar web UI.
    pub html_link: Option<String>,
    /// The status of the event.
    pub status: String,
}
