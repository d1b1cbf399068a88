// --- File: crates/tailortalk_gcal/src/logic.rs ---
//! Slot computation and the calendar operations built on it.

use std::ops::Sub;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tailortalk_common::services::{CalendarEvent, CalendarEventResult, CalendarService};
use tailortalk_common::{TailorError, TimeInterval, WorkWindow};
use tailortalk_config::GcalConfig;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::GcalAuthError;
use crate::normalize::DateParseError;
use crate::service::GcalServiceError;

pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_TIME_ZONE: Tz = Tz::Asia__Kolkata;
pub const DEFAULT_WORK_START: &str = "09:00";
pub const DEFAULT_WORK_END: &str = "18:00";
pub const DEFAULT_SLOT_MINUTES: i64 = 30;

// --- Error Handling ---
#[derive(Error, Debug)]
pub enum GcalError {
    #[error(transparent)]
    Service(#[from] GcalServiceError),
    #[error(transparent)]
    Auth(#[from] GcalAuthError),
    #[error(transparent)]
    DateParse(#[from] DateParseError),
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("Work window {start} - {end} is empty")]
    InvalidWorkWindow { start: NaiveTime, end: NaiveTime },
    #[error("Local time {0} does not exist in the configured time zone")]
    NonexistentLocalTime(NaiveDateTime),
    #[error("End time must be after start time")]
    InvalidRange,
    #[error("Duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i64),
    #[error("Google Calendar is not configured")]
    NotConfigured,
}

impl From<GcalError> for TailorError {
    fn from(err: GcalError) -> Self {
        match err {
            GcalError::Service(GcalServiceError::Conflict) => {
                TailorError::ConflictError(err.to_string())
            }
            GcalError::Service(_) | GcalError::Auth(_) => {
                tailortalk_common::external_service_error("Google Calendar", err)
            }
            GcalError::DateParse(_)
            | GcalError::InvalidRange
            | GcalError::InvalidDuration(_)
            | GcalError::NonexistentLocalTime(_) => tailortalk_common::validation_error(err),
            GcalError::InvalidTimeZone(_)
            | GcalError::InvalidTime(_)
            | GcalError::InvalidWorkWindow { .. }
            | GcalError::NotConfigured => tailortalk_common::config_error(err),
        }
    }
}

// --- Settings ---

/// Calendar, zone and work hours every operation runs against.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub calendar_id: String,
    pub time_zone: Tz,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub default_slot_minutes: i64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            time_zone: DEFAULT_TIME_ZONE,
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            default_slot_minutes: DEFAULT_SLOT_MINUTES,
        }
    }
}

impl ScheduleSettings {
    pub fn from_config(config: &GcalConfig) -> Result<Self, GcalError> {
        let time_zone = match config.time_zone.as_deref() {
            Some(name) => Tz::from_str(name).map_err(|_| GcalError::InvalidTimeZone(name.to_string()))?,
            None => DEFAULT_TIME_ZONE,
        };
        let work_start = parse_hhmm(config.work_start_time.as_deref().unwrap_or(DEFAULT_WORK_START))?;
        let work_end = parse_hhmm(config.work_end_time.as_deref().unwrap_or(DEFAULT_WORK_END))?;
        if work_start >= work_end {
            return Err(GcalError::InvalidWorkWindow {
                start: work_start,
                end: work_end,
            });
        }
        let default_slot_minutes = config.default_slot_minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
        if default_slot_minutes <= 0 {
            return Err(GcalError::InvalidDuration(default_slot_minutes));
        }

        Ok(Self {
            calendar_id: config
                .calendar_id
                .clone()
                .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string()),
            time_zone,
            work_start,
            work_end,
            default_slot_minutes,
        })
    }

    /// Current wall-clock time in the configured zone, the reference for normalization.
    pub fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.time_zone).naive_local()
    }

    /// Attaches the configured zone to a local time. Ambiguous times take the earlier offset.
    pub fn localize(&self, local: NaiveDateTime) -> Result<DateTime<Tz>, GcalError> {
        self.time_zone
            .from_local_datetime(&local)
            .earliest()
            .ok_or(GcalError::NonexistentLocalTime(local))
    }

    /// Local midnight to the following midnight.
    pub fn day_bounds(&self, date: NaiveDate) -> Result<(DateTime<Tz>, DateTime<Tz>), GcalError> {
        let start = self.localize(date.and_time(NaiveTime::default()))?;
        let next = date.succ_opt().ok_or(GcalError::InvalidRange)?;
        let end = self.localize(next.and_time(NaiveTime::default()))?;
        Ok((start, end))
    }

    pub fn work_window(&self, date: NaiveDate) -> Result<WorkWindow<DateTime<Tz>>, GcalError> {
        let start = self.localize(date.and_time(self.work_start))?;
        let end = self.localize(date.and_time(self.work_end))?;
        WorkWindow::new(start, end).ok_or(GcalError::InvalidWorkWindow {
            start: self.work_start,
            end: self.work_end,
        })
    }
}

fn parse_hhmm(value: &str) -> Result<NaiveTime, GcalError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| GcalError::InvalidTime(value.to_string()))
}

// --- Free-Interval Calculator ---

/// Gaps in `busy` inside `window` that are at least `min_duration` long.
///
/// Busy intervals are clipped to the window first, then swept in start order
/// with a cursor that only moves forward, so overlapping and unsorted input is
/// fine. A non-positive `min_duration` reports every non-empty gap.
pub fn free_slots<T>(
    busy: &[TimeInterval<T>],
    window: &WorkWindow<T>,
    min_duration: Duration,
) -> Vec<TimeInterval<T>>
where
    T: Ord + Copy + Sub<T, Output = Duration>,
{
    let mut clipped: Vec<TimeInterval<T>> =
        busy.iter().filter_map(|b| b.clip_to(window)).collect();
    clipped.sort_by_key(|b| b.start());

    // Compare gap lengths so huge durations cannot overflow the timestamp
    let fits = |from: T, to: T| from < to && to - from >= min_duration;

    let mut free = Vec::new();
    let mut cursor = window.start();
    for interval in &clipped {
        if fits(cursor, interval.start()) {
            free.extend(TimeInterval::new(cursor, interval.start()));
        }
        cursor = cursor.max(interval.end());
    }
    if fits(cursor, window.end()) {
        free.extend(TimeInterval::new(cursor, window.end()));
    }
    free
}

/// "HH:MM → HH:MM"
pub fn format_hhmm<T: Timelike + Ord + Copy>(interval: &TimeInterval<T>) -> String {
    let (start, end) = (interval.start(), interval.end());
    format!(
        "{:02}:{:02} → {:02}:{:02}",
        start.hour(),
        start.minute(),
        end.hour(),
        end.minute()
    )
}

// --- Calendar operations ---

/// Busy intervals of `date`, in the configured zone, sorted by start.
pub async fn check_availability<S>(
    service: &S,
    settings: &ScheduleSettings,
    date: NaiveDate,
) -> Result<Vec<TimeInterval<DateTime<Tz>>>, GcalError>
where
    S: CalendarService<Error = GcalServiceError> + ?Sized,
{
    let (day_start, day_end) = settings.day_bounds(date)?;
    debug!(
        "Listing busy intervals on {} for {} - {}",
        settings.calendar_id, day_start, day_end
    );
    let busy = service
        .list_busy_intervals(
            &settings.calendar_id,
            day_start.with_timezone(&Utc),
            day_end.with_timezone(&Utc),
        )
        .await?;

    let tz = settings.time_zone;
    let mut local: Vec<_> = busy
        .into_iter()
        .filter_map(|interval| interval.map(|t| t.with_timezone(&tz)))
        .collect();
    local.sort_by_key(|interval| interval.start());
    Ok(local)
}

/// Free intervals of at least `duration_minutes` within the work window of `date`.
pub async fn get_free_slots<S>(
    service: &S,
    settings: &ScheduleSettings,
    date: NaiveDate,
    duration_minutes: i64,
) -> Result<Vec<TimeInterval<DateTime<Tz>>>, GcalError>
where
    S: CalendarService<Error = GcalServiceError> + ?Sized,
{
    let min_duration = Duration::try_minutes(duration_minutes)
        .filter(|d| *d > Duration::zero())
        .ok_or(GcalError::InvalidDuration(duration_minutes))?;
    let window = settings.work_window(date)?;
    let busy = check_availability(service, settings, date).await?;
    let slots = free_slots(&busy, &window, min_duration);
    debug!(
        "{} busy, {} free slots of {}m on {}",
        busy.len(),
        slots.len(),
        duration_minutes,
        date
    );
    Ok(slots)
}

/// Creates an event between two local times in the configured zone.
pub async fn book_event<S>(
    service: &S,
    settings: &ScheduleSettings,
    title: &str,
    description: Option<String>,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<CalendarEventResult, GcalError>
where
    S: CalendarService<Error = GcalServiceError> + ?Sized,
{
    if end <= start {
        return Err(GcalError::InvalidRange);
    }
    // Fail early on times that fall into a DST gap
    settings.localize(start)?;
    settings.localize(end)?;

    let event = CalendarEvent {
        summary: title.to_string(),
        description,
        start,
        end,
        time_zone: settings.time_zone.name().to_string(),
    };
    let result = service.insert_event(&settings.calendar_id, event).await?;
    info!(
        "Booked '{}' {} - {} as {:?}",
        title, start, end, result.event_id
    );
    Ok(result)
}

// --- Request / response types ---

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct DateParams {
    /// Any phrase the normalizer accepts, e.g. "tomorrow" or "2025-07-07".
    pub date: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct FreeSlotsParams {
    pub date: String,
    pub duration_minutes: Option<i64>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TimeSlot {
    pub start: String, // RFC3339 with offset
    pub end: String,
}

impl From<&TimeInterval<DateTime<Tz>>> for TimeSlot {
    fn from(interval: &TimeInterval<DateTime<Tz>>) -> Self {
        Self {
            start: interval.start().to_rfc3339(),
            end: interval.end().to_rfc3339(),
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct BusyResponse {
    pub date: NaiveDate,
    pub time_zone: String,
    pub busy: Vec<TimeSlot>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct FreeSlotsResponse {
    pub date: NaiveDate,
    pub time_zone: String,
    pub duration_minutes: i64,
    pub slots: Vec<TimeSlot>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct BookRequest {
    pub title: String,
    /// Date/time phrase or ISO local time
    pub start: String,
    pub end: String,
    pub description: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub event_id: Option<String>,
    pub html_link: Option<String>,
    pub status: String,
    pub start: String,
    pub end: String,
}
