// File: crates/tailortalk_gcal/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
};
use tailortalk_common::TailorError;
use tracing::info;

use crate::logic::{
    book_event, check_availability, get_free_slots, BookRequest, BookResponse, BusyResponse,
    DateParams, FreeSlotsParams, FreeSlotsResponse, GcalError, ScheduleSettings, TimeSlot,
};
use crate::normalize::{normalize_date_in_zone, normalize_in_zone};
use crate::service::SharedCalendar;

// Shared state needed by GCal handlers
#[derive(Clone)]
pub struct GcalState {
    pub settings: Arc<ScheduleSettings>,
    pub calendar: SharedCalendar,
}

/// Busy intervals for one day.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/gcal/busy",
    params(DateParams),
    responses(
        (status = 200, description = "Busy intervals of the day", body = BusyResponse),
        (status = 400, description = "Date could not be understood"),
        (status = 502, description = "Google Calendar error")
    ),
    tag = "GCal"
))]
pub async fn busy_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<DateParams>,
) -> Result<Json<BusyResponse>, TailorError> {
    let settings = state.settings.as_ref();
    let date = normalize_date_in_zone(&query.date, settings.now_local(), settings.time_zone)
        .map_err(GcalError::from)?;
    info!("Busy intervals requested for {}", date);

    let busy = check_availability(state.calendar.as_ref(), settings, date).await?;
    Ok(Json(BusyResponse {
        date,
        time_zone: settings.time_zone.name().to_string(),
        busy: busy.iter().map(TimeSlot::from).collect(),
    }))
}

/// Free slots within the work window of one day.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/gcal/free-slots",
    params(FreeSlotsParams),
    responses(
        (status = 200, description = "Free slots of at least the requested duration", body = FreeSlotsResponse),
        (status = 400, description = "Date could not be understood or duration not positive"),
        (status = 502, description = "Google Calendar error")
    ),
    tag = "GCal"
))]
pub async fn free_slots_handler(
    State(state): State<Arc<GcalState>>,
    Query(query): Query<FreeSlotsParams>,
) -> Result<Json<FreeSlotsResponse>, TailorError> {
    let settings = state.settings.as_ref();
    let date = normalize_date_in_zone(&query.date, settings.now_local(), settings.time_zone)
        .map_err(GcalError::from)?;
    let duration_minutes = query
        .duration_minutes
        .unwrap_or(settings.default_slot_minutes);
    info!("Free slots requested for {} ({}m)", date, duration_minutes);

    let slots = get_free_slots(state.calendar.as_ref(), settings, date, duration_minutes).await?;
    Ok(Json(FreeSlotsResponse {
        date,
        time_zone: settings.time_zone.name().to_string(),
        duration_minutes,
        slots: slots.iter().map(TimeSlot::from).collect(),
    }))
}

/// Books an event. `start` and `end` go through the normalizer; offset
/// timestamps are converted to the configured zone.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/gcal/book",
    request_body(content = BookRequest, example = json!({
        "title": "Project sync",
        "start": "2025-07-07T15:00:00",
        "end": "2025-07-07T15:30:00"
    })),
    responses(
        (status = 200, description = "Event created", body = BookResponse),
        (status = 400, description = "Invalid times"),
        (status = 409, description = "Slot already taken"),
        (status = 502, description = "Google Calendar error")
    ),
    tag = "GCal"
))]
pub async fn book_handler(
    State(state): State<Arc<GcalState>>,
    Json(request): Json<BookRequest>,
) -> Result<Json<BookResponse>, TailorError> {
    if request.title.trim().is_empty() {
        return Err(tailortalk_common::validation_error("title must not be empty"));
    }
    let settings = state.settings.as_ref();
    let (now, zone) = (settings.now_local(), settings.time_zone);
    let start = normalize_in_zone(&request.start, now, zone).map_err(GcalError::from)?;
    let end = normalize_in_zone(&request.end, now, zone).map_err(GcalError::from)?;

    let result = book_event(
        state.calendar.as_ref(),
        settings,
        request.title.trim(),
        request.description,
        start.as_naive(),
        end.as_naive(),
    )
    .await?;

    Ok(Json(BookResponse {
        event_id: result.event_id,
        html_link: result.html_link,
        status: result.status,
        start: start.to_string(),
        end: end.to_string(),
    }))
}
