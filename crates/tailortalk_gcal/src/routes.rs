// --- File: crates/tailortalk_gcal/src/routes.rs ---

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tailortalk_config::AppConfig;

use crate::auth::shared_calendar_hub;
use crate::handlers::{book_handler, busy_handler, free_slots_handler, GcalState};
use crate::logic::{GcalError, ScheduleSettings};
use crate::service::{GoogleCalendarService, SharedCalendar};

/// Settings plus the authenticated Google Calendar client.
pub async fn build_state(config: &AppConfig) -> Result<GcalState, GcalError> {
    let gcal_config = config.gcal.as_ref().ok_or(GcalError::NotConfigured)?;
    let settings = ScheduleSettings::from_config(gcal_config)?;
    let hub = shared_calendar_hub(gcal_config).await?;
    let calendar: SharedCalendar = Arc::new(GoogleCalendarService::new(hub));

    Ok(GcalState {
        settings: Arc::new(settings),
        calendar,
    })
}

/// Creates a router containing all routes for the Google Calendar feature.
pub fn routes(state: GcalState) -> Router {
    Router::new()
        .route("/gcal/busy", get(busy_handler))
        .route("/gcal/free-slots", get(free_slots_handler))
        .route("/gcal/book", post(book_handler))
        .with_state(Arc::new(state))
}
