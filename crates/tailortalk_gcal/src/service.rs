// --- File: crates/tailortalk_gcal/src/service.rs ---
//! Google Calendar service implementation.
//!
//! This module provides an implementation of the CalendarService trait for Google Calendar.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use google_calendar3::api::{Event, EventDateTime};
use tailortalk_common::services::{
    BoxFuture, CalendarEvent, CalendarEventResult, CalendarService,
};
use tailortalk_common::TimeInterval;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::HubType;

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("Local time {0} does not exist in {1}")]
    NonexistentLocalTime(NaiveDateTime, String),
    #[error("End time must be after start time")]
    InvalidRange,
    #[error("Booking conflict")]
    Conflict,
    #[error("Calendar unavailable: {0}")]
    Unavailable(String),
}

/// The calendar handle shared by the HTTP routes and the agent tools.
pub type SharedCalendar = Arc<dyn CalendarService<Error = GcalServiceError>>;

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarService {
    /// Create a new Google Calendar service.
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }
}

impl CalendarService for GoogleCalendarService {
    type Error = GcalServiceError;

    /// Lists the timed events between `day_start` and `day_end` as busy intervals.
    ///
    /// Recurring events are expanded (`singleEvents=true`) and results are
    /// ordered by start time. All-day events carry no `dateTime` and are
    /// skipped, as are events whose end is not after their start. Result
    /// pages are followed until the API stops returning a page token.
    fn list_busy_intervals(
        &self,
        calendar_id: &str,
        day_start: DateTime<Utc>,
        day_end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<TimeInterval<DateTime<Utc>>>, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let mut busy = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut call = calendar_hub
                    .events()
                    .list(&calendar_id)
                    .time_min(day_start)
                    .time_max(day_end)
                    .single_events(true)
                    .order_by("startTime");
                if let Some(token) = page_token.as_deref() {
                    call = call.page_token(token);
                }
                let (_response, events) = call.doit().await?;

                for event in events.items.unwrap_or_default() {
                    let start = event.start.as_ref().and_then(|s| s.date_time);
                    let end = event.end.as_ref().and_then(|e| e.date_time);
                    match (start, end) {
                        (Some(start), Some(end)) => match TimeInterval::new(start, end) {
                            Some(interval) => busy.push(interval),
                            None => warn!(
                                "Skipping event {:?} with end {} not after start {}",
                                event.id, end, start
                            ),
                        },
                        _ => debug!("Skipping all-day event {:?}", event.summary),
                    }
                }

                match events.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }

            busy.sort_by_key(|interval| interval.start());
            Ok(busy)
        })
    }

    /// Inserts an event. Local start/end are resolved in the event's zone,
    /// and the zone is stored on the event so the calendar UI shows it.
    fn insert_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
        let calendar_id = calendar_id.to_string();
        let calendar_hub = self.calendar_hub.clone();

        Box::pin(async move {
            let start_utc = local_to_utc(event.start, &event.time_zone)?;
            let end_utc = local_to_utc(event.end, &event.time_zone)?;
            if end_utc <= start_utc {
                return Err(GcalServiceError::InvalidRange);
            }

            let new_event = Event {
                summary: Some(event.summary),
                description: event.description,
                start: Some(EventDateTime {
                    date_time: Some(start_utc),
                    time_zone: Some(event.time_zone.clone()),
                    ..Default::default()
                }),
                end: Some(EventDateTime {
                    date_time: Some(end_utc),
                    time_zone: Some(event.time_zone),
                    ..Default::default()
                }),
                ..Default::default()
            };

            let (_response, created_event) = calendar_hub
                .events()
                .insert(new_event, &calendar_id)
                .doit()
                .await?;
            info!("Created event {:?} on {}", created_event.id, calendar_id);

            Ok(CalendarEventResult {
                event_id: created_event.id,
                html_link: created_event.html_link,
                status: created_event
                    .status
                    .unwrap_or_else(|| "confirmed".to_string()),
            })
        })
    }
}

/// Resolves a wall-clock time in the named IANA zone to UTC.
pub fn local_to_utc(local: NaiveDateTime, time_zone: &str) -> Result<DateTime<Utc>, GcalServiceError> {
    let tz = Tz::from_str(time_zone)
        .map_err(|_| GcalServiceError::InvalidTimeZone(time_zone.to_string()))?;
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| GcalServiceError::NonexistentLocalTime(local, time_zone.to_string()))
}

/// In-memory CalendarService for tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct StoredEvent {
        pub event_id: String,
        pub summary: String,
        pub interval: TimeInterval<DateTime<Utc>>,
    }

    /// Mock calendar service for testing.
    #[derive(Default)]
    pub struct MockCalendarService {
        events: Mutex<HashMap<String, Vec<StoredEvent>>>,
        reject_conflicts: bool,
        unavailable: bool,
    }

    impl MockCalendarService {
        /// Create a new mock calendar service.
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts overlapping an existing event fail with `Conflict`.
        pub fn rejecting_conflicts(mut self) -> Self {
            self.reject_conflicts = true;
            self
        }

        /// Every call fails, as if the API could not be reached.
        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        /// Seeds a busy event given in UTC.
        pub fn with_event(
            self,
            calendar_id: &str,
            summary: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Self {
            if let Some(interval) = TimeInterval::new(start, end) {
                self.store(calendar_id, summary, interval);
            }
            self
        }

        /// Everything stored on `calendar_id`, in insertion order.
        pub fn events(&self, calendar_id: &str) -> Vec<StoredEvent> {
            self.lock().get(calendar_id).cloned().unwrap_or_default()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<StoredEvent>>> {
            self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        fn store(
            &self,
            calendar_id: &str,
            summary: &str,
            interval: TimeInterval<DateTime<Utc>>,
        ) -> String {
            let event_id = format!("mock-event-{}", uuid::Uuid::new_v4());
            self.lock()
                .entry(calendar_id.to_string())
                .or_default()
                .push(StoredEvent {
                    event_id: event_id.clone(),
                    summary: summary.to_string(),
                    interval,
                });
            event_id
        }

        fn check_available(&self) -> Result<(), GcalServiceError> {
            if self.unavailable {
                return Err(GcalServiceError::Unavailable("mock calendar offline".to_string()));
            }
            Ok(())
        }
    }

    impl CalendarService for MockCalendarService {
        type Error = GcalServiceError;

        fn list_busy_intervals(
            &self,
            calendar_id: &str,
            day_start: DateTime<Utc>,
            day_end: DateTime<Utc>,
        ) -> BoxFuture<'_, Vec<TimeInterval<DateTime<Utc>>>, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                self.check_available()?;
                let range = TimeInterval::new(day_start, day_end).ok_or(GcalServiceError::InvalidRange)?;
                let mut busy: Vec<_> = self
                    .events(&calendar_id)
                    .into_iter()
                    .map(|event| event.interval)
                    .filter(|interval| interval.overlaps(&range))
                    .collect();
                busy.sort_by_key(|interval| interval.start());
                Ok(busy)
            })
        }

        fn insert_event(
            &self,
            calendar_id: &str,
            event: CalendarEvent,
        ) -> BoxFuture<'_, CalendarEventResult, Self::Error> {
            let calendar_id = calendar_id.to_string();

            Box::pin(async move {
                self.check_available()?;
                let start = local_to_utc(event.start, &event.time_zone)?;
                let end = local_to_utc(event.end, &event.time_zone)?;
                let interval = TimeInterval::new(start, end).ok_or(GcalServiceError::InvalidRange)?;

                if self.reject_conflicts
                    && self
                        .events(&calendar_id)
                        .iter()
                        .any(|existing| existing.interval.overlaps(&interval))
                {
                    return Err(GcalServiceError::Conflict);
                }

                let event_id = self.store(&calendar_id, &event.summary, interval);
                Ok(CalendarEventResult {
                    html_link: Some(format!("https://calendar.example.com/event?eid={event_id}")),
                    event_id: Some(event_id),
                    status: "confirmed".to_string(),
                })
            })
        }
    }
}
