// File: crates/tailortalk_gcal/src/doc.rs
#![cfg(feature = "openapi")]

use utoipa::OpenApi;

use crate::logic::{
    BookRequest, BookResponse, BusyResponse, DateParams, FreeSlotsParams, FreeSlotsResponse,
    TimeSlot,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::busy_handler,
        crate::handlers::free_slots_handler,
        crate::handlers::book_handler
    ),
    components(
        schemas(
            DateParams,
            FreeSlotsParams,
            TimeSlot,
            BusyResponse,
            FreeSlotsResponse,
            BookRequest,
            BookResponse
        )
    ),
    tags(
        (name = "GCal", description = "Calendar availability and booking")
    ),
    servers(
        (url = "/api", description = "TailorTalk API server")
    )
)]
pub struct GcalApiDoc;
