#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use chrono::TimeZone;
    use chrono_tz::Tz;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::handlers::GcalState;
    use crate::logic::ScheduleSettings;
    use crate::routes::routes;
    use crate::service::mock::MockCalendarService;

    fn app(service: MockCalendarService) -> (Router, Arc<MockCalendarService>) {
        let service = Arc::new(service);
        let state = GcalState {
            settings: Arc::new(ScheduleSettings::default()),
            calendar: service.clone(),
        };
        (routes(state), service)
    }

    fn ist(hour: u32, minute: u32) -> chrono::DateTime<chrono::Utc> {
        Tz::Asia__Kolkata
            .with_ymd_and_hms(2025, 7, 7, hour, minute, 0)
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_busy_handler() {
        let (app, _) = app(
            MockCalendarService::new().with_event("primary", "Standup", ist(10, 0), ist(10, 30)),
        );

        let (status, body) = send(app, get("/gcal/busy?date=2025-07-07")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date"], "2025-07-07");
        assert_eq!(body["time_zone"], "Asia/Kolkata");
        assert_eq!(
            body["busy"],
            json!([{ "start": "2025-07-07T10:00:00+05:30", "end": "2025-07-07T10:30:00+05:30" }])
        );
    }

    #[tokio::test]
    async fn test_busy_handler_rejects_unknown_date() {
        let (app, _) = app(MockCalendarService::new());
        let (status, body) = send(app, get("/gcal/busy?date=someday")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_free_slots_handler_uses_default_duration() {
        let (app, _) = app(
            MockCalendarService::new().with_event("primary", "Block", ist(9, 20), ist(17, 0)),
        );

        let (status, body) = send(app, get("/gcal/free-slots?date=2025-07-07")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["duration_minutes"], 30);
        // 09:00-09:20 is too short for the 30 minute default
        assert_eq!(
            body["slots"],
            json!([{ "start": "2025-07-07T17:00:00+05:30", "end": "2025-07-07T18:00:00+05:30" }])
        );
    }

    #[tokio::test]
    async fn test_free_slots_handler_rejects_zero_duration() {
        let (app, _) = app(MockCalendarService::new());
        let (status, _) = send(
            app,
            get("/gcal/free-slots?date=2025-07-07&duration_minutes=0"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_free_slots_handler_rejects_overflowing_duration() {
        let (app, _) = app(MockCalendarService::new());
        let (status, body) = send(
            app,
            get(&format!(
                "/gcal/free-slots?date=2025-07-07&duration_minutes={}",
                i64::MAX
            )),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_book_handler() {
        let (app, service) = app(MockCalendarService::new());
        let (status, body) = send(
            app,
            post_json(
                "/gcal/book",
                json!({ "title": "Project sync", "start": "2025-07-07T15:00:00", "end": "2025-07-07 15:30" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "confirmed");
        assert_eq!(body["start"], "2025-07-07T15:00:00");
        assert_eq!(body["end"], "2025-07-07T15:30:00");
        let stored = service.events("primary");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].summary, "Project sync");
    }

    #[tokio::test]
    async fn test_book_handler_converts_offsets_to_local_zone() {
        let (app, service) = app(MockCalendarService::new());
        let (status, body) = send(
            app,
            post_json(
                "/gcal/book",
                json!({ "title": "Remote sync", "start": "2025-07-07T09:30:00Z", "end": "2025-07-07T10:00:00Z" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["start"], "2025-07-07T15:00:00");
        assert_eq!(body["end"], "2025-07-07T15:30:00");
        let stored = service.events("primary");
        assert_eq!(stored[0].interval.start(), ist(15, 0));
        assert_eq!(stored[0].interval.end(), ist(15, 30));
    }

    #[tokio::test]
    async fn test_book_handler_conflict() {
        let (app, _) = app(
            MockCalendarService::new()
                .rejecting_conflicts()
                .with_event("primary", "Taken", ist(15, 0), ist(16, 0)),
        );
        let (status, body) = send(
            app,
            post_json(
                "/gcal/book",
                json!({ "title": "Overlap", "start": "2025-07-07T15:30:00", "end": "2025-07-07T16:30:00" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], 409);
    }

    #[tokio::test]
    async fn test_book_handler_validates_input() {
        let (app_a, _) = app(MockCalendarService::new());
        let (status, _) = send(
            app_a,
            post_json(
                "/gcal/book",
                json!({ "title": "  ", "start": "2025-07-07T15:00:00", "end": "2025-07-07T16:00:00" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (app_b, service) = app(MockCalendarService::new());
        let (status, _) = send(
            app_b,
            post_json(
                "/gcal/book",
                json!({ "title": "Backwards", "start": "2025-07-07T16:00:00", "end": "2025-07-07T15:00:00" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(service.events("primary").is_empty());
    }

    #[tokio::test]
    async fn test_calendar_failure_is_bad_gateway() {
        let (app, _) = app(MockCalendarService::unavailable());
        let (status, body) = send(app, get("/gcal/busy?date=2025-07-07")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Calendar unavailable"));
    }
}
