//! The telephony side of a call: the provider's bidirectional media stream.

use super::map_ws_error;
use crate::state::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, future};
use pam_core::{Connection, RelayError, WsFrame};
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::{info, warn};

/// Axum handler to upgrade the provider's request to a media-stream WebSocket.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Telephony provider connected to media stream.");
    match state.bridge.accept(telephony_connection(socket)).await {
        Ok(summary) => info!(
            session_id = %summary.session_id,
            call_sid = ?summary.inbound.call_sid,
            ended_by = ?summary.ended_by,
            "Call ended."
        ),
        Err(e) => warn!(error = %e, "Call ended before any audio was relayed."),
    }
}

/// Adapts an accepted axum socket to the relay's connection interface.
fn telephony_connection(socket: WebSocket) -> Connection {
    let (sink, stream) = socket.split();
    let sink = sink
        .sink_map_err(map_axum_error)
        .with(|text: String| future::ready(Ok::<_, RelayError>(Message::Text(text.into()))));
    let stream = stream.map(|msg| msg.map(into_frame).map_err(map_axum_error));
    Connection::new(sink, stream)
}

/// Unwraps the tungstenite error axum reports so a hung-up caller reads as closed.
fn map_axum_error(err: axum::Error) -> RelayError {
    match err.into_inner().downcast::<WsError>() {
        Ok(ws) => map_ws_error(*ws),
        Err(other) => RelayError::transport(other),
    }
}

fn into_frame(msg: Message) -> WsFrame {
    match msg {
        Message::Text(text) => WsFrame::Text(text.as_str().to_owned()),
        Message::Close(_) => WsFrame::Close,
        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => WsFrame::Other,
    }
}
