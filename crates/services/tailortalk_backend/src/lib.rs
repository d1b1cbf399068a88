// File: services/tailortalk_backend/src/lib.rs
use std::path::Path;
use std::sync::Arc;

use axum::{routing::get, Router};
use http::{header, HeaderValue, Method};
use tailortalk_agent::{routes as agent_routes, CalendarAgent};
use tailortalk_gcal::{handlers::GcalState, routes as gcal_routes};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub const WELCOME_MESSAGE: &str = "Welcome to TailorTalk API!";

/// Directory holding the chat UI, relative to the working directory.
pub const DEFAULT_STATIC_DIR: &str = "dist";

/// Routes under `/api`: welcome text, calendar routes and `/chat`.
pub fn api_router(gcal_state: GcalState, agent: Arc<CalendarAgent>) -> Router {
    let router = Router::new()
        .route("/", get(|| async { WELCOME_MESSAGE }))
        .merge(gcal_routes::routes(gcal_state))
        .merge(agent_routes::routes(agent));
    Router::new().nest("/api", router)
}

/// Browser access for the configured origins; an empty list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        warn!("No CORS origins configured, allowing any origin");
        return CorsLayer::permissive();
    }

    info!("CORS configured for origins: {:?}", origins);
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// The complete application: API, optional Swagger UI, chat UI fallback and middleware.
pub fn build_app(
    gcal_state: GcalState,
    agent: Arc<CalendarAgent>,
    allowed_origins: &[String],
    static_dir: &Path,
) -> Router {
    let mut app = api_router(gcal_state, agent);

    #[cfg(feature = "openapi")]
    {
        app = app.merge(swagger_ui());
    }

    if static_dir.is_dir() {
        info!("Serving chat UI from {}", static_dir.display());
        app = app.fallback_service(ServeDir::new(static_dir));
    } else {
        warn!(
            "Static directory {} not found, chat UI disabled",
            static_dir.display()
        );
    }

    app.layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

#[cfg(feature = "openapi")]
fn swagger_ui() -> utoipa_swagger_ui::SwaggerUi {
    use tailortalk_agent::doc::ChatApiDoc;
    use tailortalk_gcal::doc::GcalApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    #[derive(OpenApi)]
    #[openapi(
        info(
            title = "TailorTalk API",
            version = "0.1.0",
            description = "Conversational calendar assistant",
            license(name = "MIT", url = "https://opensource.org/licenses/MIT")
        ),
        servers((url = "/api", description = "Main API Prefix")),
    )]
    struct ApiDoc;

    let mut openapi_doc = ApiDoc::openapi();
    openapi_doc.merge(GcalApiDoc::openapi());
    openapi_doc.merge(ChatApiDoc::openapi());
    info!("Adding Swagger UI at /api/docs");

    SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc)
}
