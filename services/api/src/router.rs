//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application:
//! the call-signaling and outbound-call endpoints, the media-stream
//! WebSocket, and the OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, OutboundCallPayload, OutboundCallResponse},
    signaling::{INCOMING_CALL_PATH, MEDIA_STREAM_PATH},
    state::AppState,
    ws::media_stream_handler,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::incoming_call, handlers::make_outbound_call),
    components(schemas(OutboundCallPayload, OutboundCallResponse, ErrorResponse)),
    tags(
        (name = "Pam Relay", description = "Call signaling and outbound calls for the AI phone assistant")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route(
            INCOMING_CALL_PATH,
            get(handlers::incoming_call).post(handlers::incoming_call),
        )
        .route("/make-outbound-call", post(handlers::make_outbound_call))
        .route(MEDIA_STREAM_PATH, get(media_stream_handler))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
}
