//! Axum Handlers for the call-signaling and outbound-call endpoints.
//!
//! The `utoipa` doc attributes feed the generated OpenAPI document.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    models::{ErrorResponse, OutboundCallPayload, OutboundCallResponse},
    signaling,
    state::AppState,
};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// A server-side failure whose message is safe to show the caller.
    ServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::ServerError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Answer an incoming (or newly answered outbound) call.
///
/// Returns TwiML that connects the call to the `/media-stream` WebSocket.
#[utoipa::path(
    method(get, post),
    path = "/incoming-call",
    responses(
        (status = 200, description = "TwiML connecting the call to the media stream", body = String, content_type = "application/xml"),
        (status = 400, description = "Public host could not be determined", body = ErrorResponse)
    )
)]
pub async fn incoming_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let domain = signaling::public_domain(state.config.public_host.as_deref(), &headers)
        .ok_or_else(|| ApiError::BadRequest("Cannot determine the public host".to_string()))?;
    let stream_url = signaling::media_stream_url(&domain);
    info!(%stream_url, "Answering call with media stream instructions.");

    Ok((
        [(header::CONTENT_TYPE, "application/xml")],
        signaling::connect_twiml(&stream_url),
    ))
}

/// Place an outbound call that is connected to the AI assistant once answered.
#[utoipa::path(
    post,
    path = "/make-outbound-call",
    request_body = OutboundCallPayload,
    responses(
        (status = 200, description = "Call created", body = OutboundCallResponse),
        (status = 400, description = "Missing destination number", body = ErrorResponse),
        (status = 500, description = "Twilio not configured or call creation failed", body = ErrorResponse)
    )
)]
pub async fn make_outbound_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<OutboundCallPayload>,
) -> Result<Json<OutboundCallResponse>, ApiError> {
    let to = payload
        .to
        .map(|to| to.trim().to_string())
        .filter(|to| !to.is_empty())
        .ok_or_else(|| ApiError::BadRequest("'to' number is required".to_string()))?;

    let originator = state
        .call_originator
        .as_ref()
        .ok_or_else(|| ApiError::ServerError("Twilio credentials are missing".to_string()))?;

    // A configured host keeps any explicit scheme it was given.
    let base = match state.config.public_host.as_deref() {
        Some(host) => host.to_string(),
        None => signaling::public_domain(None, &headers)
            .ok_or_else(|| ApiError::BadRequest("Cannot determine the public host".to_string()))?,
    };
    let twiml_url = signaling::incoming_call_url(&base);

    let call_sid = originator.originate(&to, &twiml_url).await.map_err(|e| {
        error!(error = ?e, "Failed to create outbound call.");
        ApiError::ServerError(e.to_string())
    })?;

    Ok(Json(OutboundCallResponse {
        success: true,
        call_sid,
    }))
}
